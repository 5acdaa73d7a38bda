//! Source clip references.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::media::MediaProbe;

/// One source video in playback order.
///
/// The duration is probed on first use and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipReference {
    /// Path to the source file.
    pub path: PathBuf,
    /// File stem, used to find `<stem>.srt` in the caption directory.
    pub stem: String,
    #[serde(default, skip_serializing_if = "is_unprobed", with = "probed")]
    duration: OnceLock<f64>,
}

impl ClipReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            stem,
            duration: OnceLock::new(),
        }
    }

    /// Clip whose duration is already known.
    pub fn with_duration(path: impl Into<PathBuf>, secs: f64) -> Self {
        let clip = Self::new(path);
        let _ = clip.duration.set(secs.max(0.0));
        clip
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Probed duration in seconds, probing on first call.
    ///
    /// Probe failures and negative values count as 0.0 so a broken clip
    /// contributes no offset.
    pub fn duration(&self, probe: &MediaProbe<'_>) -> f64 {
        *self.duration.get_or_init(|| match probe.duration(&self.path) {
            Ok(secs) => secs.max(0.0),
            Err(e) => {
                tracing::warn!(
                    "Could not probe duration of {}: {}; using 0.0",
                    self.path.display(),
                    e
                );
                0.0
            }
        })
    }

    /// Duration if it has been probed already.
    pub fn probed_duration(&self) -> Option<f64> {
        self.duration.get().copied()
    }
}

fn is_unprobed(cell: &OnceLock<f64>) -> bool {
    cell.get().is_none()
}

mod probed {
    use std::sync::OnceLock;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(cell: &OnceLock<f64>, s: S) -> Result<S::Ok, S::Error> {
        match cell.get() {
            Some(v) => s.serialize_some(v),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<OnceLock<f64>, D::Error> {
        let cell = OnceLock::new();
        if let Some(v) = Option::<f64>::deserialize(d)? {
            let _ = cell.set(v);
        }
        Ok(cell)
    }
}
