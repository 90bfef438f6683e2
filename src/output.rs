//! CLI output formatting.
//!
//! Each command ends by listing what it wrote. Format functions are pure
//! (no I/O, no side effects) and the `print_*` wrappers write to stdout, so
//! tests assert on strings.

use crate::store::SavedImage;

/// Human-readable byte count: `987 B`, `12.3 KB`, `4.0 MB`.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

/// One line per saved image: index, path, dimensions, size.
pub fn format_saved(results: &[SavedImage]) -> Vec<String> {
    results
        .iter()
        .enumerate()
        .map(|(i, saved)| {
            let dims = match saved.dimensions {
                Some((w, h)) => format!("{w}x{h}"),
                None => "?".to_string(),
            };
            format!(
                "{:0>3} {}  {dims}  {}",
                i + 1,
                saved.path.display(),
                format_size(saved.bytes)
            )
        })
        .collect()
}

pub fn print_saved(results: &[SavedImage]) {
    for line in format_saved(results) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn size_units() {
        assert_eq!(format_size(987), "987 B");
        assert_eq!(format_size(12 * 1024 + 307), "12.3 KB");
        assert_eq!(format_size(4 * 1024 * 1024), "4.0 MB");
    }

    #[test]
    fn saved_lines_show_index_dims_and_size() {
        let results = vec![
            SavedImage {
                path: PathBuf::from("out/room-ab12cd34.png"),
                bytes: 2048,
                dimensions: Some((1920, 1080)),
            },
            SavedImage {
                path: PathBuf::from("out/room-ffee0011.png"),
                bytes: 10,
                dimensions: None,
            },
        ];
        let lines = format_saved(&results);
        assert_eq!(lines[0], "001 out/room-ab12cd34.png  1920x1080  2.0 KB");
        assert_eq!(lines[1], "002 out/room-ffee0011.png  ?  10 B");
    }
}
