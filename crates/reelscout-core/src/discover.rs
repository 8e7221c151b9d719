//! Media discovery for expanding CLI inputs into a dispatch list.

use std::path::Path;
use walkdir::WalkDir;

/// Video extensions accepted when expanding directories.
const MEDIA_EXTENSIONS: [&str; 8] = [
    "mp4", "webm", "mkv", "mov", "jpg", "jpeg", "png", "webp",
];

/// Expand a mixed list of URLs, files, and directories into an ordered
/// media reference list.
///
/// URLs and explicit file paths pass through untouched; directories are
/// walked recursively for supported media, sorted by path for a
/// deterministic dispatch order. Inputs that are neither are kept as-is —
/// the gateway reports the missing file, the dispatcher records it.
pub fn expand_inputs(inputs: &[String]) -> Vec<String> {
    let mut media = Vec::new();

    for input in inputs {
        if input.starts_with("http://") || input.starts_with("https://") {
            media.push(input.clone());
            continue;
        }

        let path = Path::new(input);
        if path.is_dir() {
            let mut found: Vec<String> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_file() && is_supported(entry.path()))
                .map(|entry| entry.path().to_string_lossy().into_owned())
                .collect();
            found.sort();
            media.extend(found);
        } else {
            media.push(input.clone());
        }
    }

    media
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lowered = ext.to_lowercase();
            MEDIA_EXTENSIONS.iter().any(|supported| *supported == lowered)
        })
        .unwrap_or(false)
}
