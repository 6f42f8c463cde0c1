use std::path::Path;

const CONTAINER_MARKERS: [&str; 2] = ["mp4", "webm"];

/// Derive the run label from a log file name.
///
/// Local playback logs are named after the video (`4K-AV1.mp4.txt`), so the
/// label is everything before the first `.`. Browser logs are named after
/// the run itself (`Safari-VP9-HW.txt`) and only lose their extension.
pub fn run_label(file_name: &str) -> String {
    let stem = strip_extension(file_name);
    if CONTAINER_MARKERS.iter().any(|marker| file_name.contains(marker)) {
        stem.split('.').next().unwrap_or(stem).to_string()
    } else {
        stem.to_string()
    }
}

/// Label for a log path, using only its final component.
pub fn run_label_for_path(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    run_label(&file_name)
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        // a leading dot is part of the name, not an extension
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}
