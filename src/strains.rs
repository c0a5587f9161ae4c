use std::collections::HashMap;
use std::path::Path;

use poem_types::{PoemId, StrainRecord, Strains};

use crate::error::Error;
use crate::scanner::{DataFile, scan_json_files};

/// Poem id → tonal-pattern data, merged across every strains file.
#[derive(Debug, Default)]
pub struct StrainIndex {
    entries: HashMap<PoemId, Strains>,
    /// How many inserts replaced an id already present
    pub overwritten: usize,
}

impl StrainIndex {
    /// Insert, replacing any earlier value for the same id.
    pub fn insert(&mut self, id: PoemId, strains: Strains) {
        if self.entries.insert(id, strains).is_some() {
            self.overwritten += 1;
        }
    }

    pub fn get(&self, id: &PoemId) -> Option<&Strains> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &PoemId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of loading a strains directory.
#[derive(Debug, Default)]
pub struct StrainLoad {
    pub index: StrainIndex,
    /// `.json` files found in the directory
    pub files_considered: usize,
    /// Files that could not be read or parsed
    pub skipped: Vec<String>,
}

/// Read one strains file as a list of records.
fn read_strain_file(file: &DataFile) -> Result<Vec<StrainRecord>, Error> {
    let json = std::fs::read_to_string(&file.path).map_err(|e| Error::io(&file.path, e))?;
    serde_json::from_str(&json).map_err(|e| Error::json(&file.path, e))
}

/// Load every `.json` file in `dir` into one index.
///
/// Files are applied in name order, so for an id present in several files
/// the last file wins. Unparseable files are skipped with a warning.
pub fn load_strains(dir: &Path) -> Result<StrainLoad, Error> {
    tracing::info!(dir = %dir.display(), "loading strain data");

    let files = scan_json_files(dir)?;
    let mut load = StrainLoad {
        files_considered: files.len(),
        ..Default::default()
    };

    for file in &files {
        let records = match read_strain_file(file) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(file = %file.name, error = %e, "skipping strain file");
                load.skipped.push(file.name.clone());
                continue;
            }
        };

        for record in records {
            if load.index.contains(&record.id) {
                tracing::debug!(id = %record.id, file = %file.name, "strain entry overwritten");
            }
            load.index.insert(record.id, record.strains);
        }
    }

    tracing::info!(
        files = load.files_considered,
        skipped = load.skipped.len(),
        entries = load.index.len(),
        overwritten = load.index.overwritten,
        "strain data loaded"
    );

    Ok(load)
}
