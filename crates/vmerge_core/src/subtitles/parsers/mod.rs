//! Subtitle parsers.

mod srt;

pub use srt::{parse_srt, parse_srt_time};

/// Decode subtitle bytes as UTF-8, dropping invalid sequences.
///
/// A leading byte-order mark is removed.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_bytes_are_dropped() {
        let bytes = b"caf\xff\xfee ok";
        assert_eq!(decode_lossy(bytes), "cafe ok");
    }

    #[test]
    fn bom_is_stripped() {
        let bytes = "\u{feff}1\n".as_bytes();
        assert_eq!(decode_lossy(bytes), "1\n");
    }
}
