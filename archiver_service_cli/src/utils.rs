use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Normalizes a user-supplied destination path: backslashes become forward
/// slashes, every segment is trimmed, empty segments and leading/trailing
/// separators disappear. `"artigos/ Teste "` becomes `"artigos/Teste"`.
pub fn normalize_folder_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Last segment of an already-normalized path, when there is one.
pub fn last_segment(path: &str) -> Option<&str> {
    path.rsplit('/').find(|segment| !segment.is_empty())
}

/// Download filename for the final bundle: separators flattened to hyphens.
pub fn zip_filename(normalized_path: &str) -> String {
    format!("arquivo_{}.zip", normalized_path.replace('/', "-"))
}

/// First `max` characters of `text`, respecting char boundaries.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

pub fn save_bytes(bytes: &[u8], path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    println!("✅ {} criado.", path.display());
    Ok(())
}
