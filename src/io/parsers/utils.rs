use std::path::Path;

/// Get the file name with its base extension removed, ignoring compression-related
/// extensions (`.gz` and `.bgz`), e.g. `path/regions.bed.gz` gives `regions` and `path/sample1.bam`
/// gives `sample1`.
pub fn get_base_stem<P: AsRef<Path>>(filepath: P) -> String {
    let parts = filename_parts(filepath.as_ref());
    let ignore_extensions = ["gz", "bgz"];

    let mut keep = parts.len();
    if keep > 2 && ignore_extensions.contains(&parts[keep - 1].as_str()) {
        keep -= 1;
    }
    if keep > 1 {
        keep -= 1;
    }
    parts[..keep].join(".")
}

fn filename_parts(path: &Path) -> Vec<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
        .split('.')
        .map(String::from)
        .collect()
}
