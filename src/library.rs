//! Document library scan.
//!
//! Walks the configured library root for plain-text files and returns them
//! in the shape the frontend expects: identifier, path pieces, and full
//! content. The scan is read-only and deterministic (sorted by path).

use std::path::Path;

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::Result;

/// One library document sent to the frontend.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryFile {
    /// Full normalized path, used as the document identifier.
    pub id: String,
    /// Path relative to the library root, `/`-separated.
    pub path: String,
    #[serde(rename = "pathList")]
    pub path_list: Vec<String>,
    pub name: String,
    pub text: String,
}

/// Collect every `.txt` file under `root`. File contents are decoded
/// lossily; the library holds plain text only.
pub fn scan_library(root: &Path) -> Result<Vec<LibraryFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::Other, format!("library walk failed: {}", e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if !name.trim().to_lowercase().ends_with(".txt") {
            continue;
        }

        let bytes = std::fs::read(entry.path())?;
        let text = String::from_utf8_lossy(&bytes).to_string();

        let id = normalize_path(&entry.path().to_string_lossy());
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .to_string();
        let path = normalize_path(&rel);
        let path_list = path.split('/').map(|s| s.to_string()).collect();

        files.push(LibraryFile {
            id,
            path,
            path_list,
            name,
            text,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn normalize_path(path: &str) -> String {
    path.replace(std::path::MAIN_SEPARATOR, "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("world/region")).unwrap();
        fs::write(tmp.path().join("alpha.txt"), "alpha body").unwrap();
        fs::write(tmp.path().join("world/region/beta.txt"), "beta body").unwrap();
        fs::write(tmp.path().join("ignored.md"), "not a txt").unwrap();
        tmp
    }

    #[test]
    fn test_scan_finds_only_txt_files() {
        let tmp = setup();
        let files = scan_library(tmp.path()).unwrap();
        assert_eq!(files.len(), 2);
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"alpha.txt"));
        assert!(names.contains(&"beta.txt"));
    }

    #[test]
    fn test_paths_are_relative_and_split() {
        let tmp = setup();
        let files = scan_library(tmp.path()).unwrap();
        let beta = files.iter().find(|f| f.name == "beta.txt").unwrap();
        assert_eq!(beta.path, "world/region/beta.txt");
        assert_eq!(beta.path_list, vec!["world", "region", "beta.txt"]);
        assert_eq!(beta.text, "beta body");
    }

    #[test]
    fn test_sorted_and_deterministic() {
        let tmp = setup();
        let a = scan_library(tmp.path()).unwrap();
        let b = scan_library(tmp.path()).unwrap();
        let paths_a: Vec<&str> = a.iter().map(|f| f.path.as_str()).collect();
        let paths_b: Vec<&str> = b.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths_a, paths_b);
        let mut sorted = paths_a.clone();
        sorted.sort();
        assert_eq!(paths_a, sorted);
    }
}
