use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Error;

/// A JSON data file discovered in a corpus directory.
#[derive(Debug, Clone)]
pub struct DataFile {
    /// File name including extension, e.g. "poet.tang.0.json"
    pub name: String,
    pub path: PathBuf,
}

impl DataFile {
    /// File name without its extension, used to name the Markdown output.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

/// List the `.json` files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into. A missing or unreadable `dir` is
/// an error; individual unreadable entries are skipped.
pub fn scan_json_files(dir: &Path) -> Result<Vec<DataFile>, Error> {
    // Surface a missing directory up front; WalkDir would only report it
    // as an entry error, which we otherwise skip.
    std::fs::read_dir(dir).map_err(|source| Error::MissingDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut results = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path().to_path_buf();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue, // non-UTF-8 names can't carry a dynasty hint
        };

        results.push(DataFile { name, path });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_only_json_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "[]").unwrap();
        fs::write(dir.path().join("a.json"), "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("upper.JSON"), "[]").unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let files = scan_json_files(dir.path()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.json", "b.json"]);
    }

    #[test]
    fn test_scan_missing_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_json_files(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, Error::MissingDirectory { .. }));
    }

    #[test]
    fn test_stem() {
        let f = DataFile {
            name: "poet.tang.0.json".into(),
            path: PathBuf::from("poet.tang.0.json"),
        };
        assert_eq!(f.stem(), "poet.tang.0");
    }
}
