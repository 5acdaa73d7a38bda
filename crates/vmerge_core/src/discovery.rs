//! Input discovery: clips and background music.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Default clip extensions.
pub const DEFAULT_VIDEO_EXTS: &[&str] = &[".mp4", ".mov", ".mkv", ".avi"];

/// Default background-music extensions.
pub const DEFAULT_BGM_EXTS: &[&str] = &[".mp3", ".wav", ".m4a", ".flac", ".aac", ".ogg"];

/// All files under `dir` (recursively) whose extension is in `exts`,
/// sorted by case-insensitive file name.
///
/// Extensions match case-insensitively and may be given with or without
/// the leading dot. A missing directory yields an empty list.
pub fn find_files_sorted<S: AsRef<str>>(dir: &Path, exts: &[S]) -> Vec<PathBuf> {
    let wanted: Vec<String> = exts
        .iter()
        .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    if !dir.is_dir() {
        tracing::debug!("{} is not a directory; nothing to discover", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| wanted.contains(&ext.to_string_lossy().to_lowercase()))
                .unwrap_or(false)
        })
        .collect();

    files.sort_by_cached_key(|path| (sort_name(path), path.clone()));
    files
}

/// First background track in `dir`, alphabetically.
pub fn pick_bgm_file<S: AsRef<str>>(dir: &Path, exts: &[S]) -> Option<PathBuf> {
    find_files_sorted(dir, exts).into_iter().next()
}

fn sort_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
