use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use serde_json::Value;

use crate::config::Config;
use crate::error::Error;
use crate::normalize::ScriptNormalizer;
use crate::scanner::{DataFile, scan_json_files};
use crate::strains::{StrainIndex, load_strains};
use crate::transform::{DroppedPoem, transform_file};

/// Separator written after every poem fragment.
const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Outcome for one poem file that was written.
#[derive(Debug)]
pub struct FileReport {
    pub source: String,
    pub output: PathBuf,
    pub converted: usize,
    pub dropped: Vec<DroppedPoem>,
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub strain_files: usize,
    pub strain_files_skipped: usize,
    pub strain_entries: usize,
    pub strain_overwrites: usize,
    pub files: Vec<FileReport>,
    /// Poem files that could not be read, parsed or written
    pub failed: Vec<(String, String)>,
    /// True when the run stopped after the first output file
    pub stopped_early: bool,
}

impl RunSummary {
    pub fn converted(&self) -> usize {
        self.files.iter().map(|f| f.converted).sum()
    }
}

/// Strain loading, poem conversion and Markdown output for one run.
pub struct Pipeline<N: ScriptNormalizer> {
    config: Config,
    normalizer: N,
}

impl<N: ScriptNormalizer> Pipeline<N> {
    pub fn new(config: Config, normalizer: N) -> Self {
        Self { config, normalizer }
    }

    /// Run the whole batch.
    ///
    /// Only missing source directories and an uncreatable output directory
    /// are errors; bad files and records are logged and skipped.
    pub fn run(&self) -> Result<RunSummary, Error> {
        let poem_files = scan_json_files(&self.config.poem_dir)?;

        std::fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| Error::io(&self.config.output_dir, e))?;

        let load = load_strains(&self.config.strain_dir)?;
        let mut summary = RunSummary {
            strain_files: load.files_considered,
            strain_files_skipped: load.skipped.len(),
            strain_entries: load.index.len(),
            strain_overwrites: load.index.overwritten,
            ..Default::default()
        };

        tracing::info!(
            dir = %self.config.poem_dir.display(),
            files = poem_files.len(),
            "processing poem files"
        );

        for (i, file) in poem_files.iter().enumerate() {
            match self.convert_file(file, &load.index) {
                Ok(report) => {
                    tracing::info!(
                        file = %file.name,
                        converted = report.converted,
                        dropped = report.dropped.len(),
                        "file converted"
                    );
                    summary.files.push(report);
                }
                Err(e) => {
                    tracing::error!(file = %file.name, error = %e, "failed to process file");
                    summary.failed.push((file.name.clone(), e.to_string()));
                    continue;
                }
            }

            if !self.config.all_files {
                let remaining = poem_files.len() - i - 1;
                if remaining > 0 {
                    tracing::info!(remaining, "stopping after first output file");
                    summary.stopped_early = true;
                }
                break;
            }
        }

        Ok(summary)
    }

    fn convert_file(&self, file: &DataFile, index: &StrainIndex) -> Result<FileReport, Error> {
        let json = std::fs::read_to_string(&file.path).map_err(|e| Error::io(&file.path, e))?;
        let records: Vec<Value> =
            serde_json::from_str(&json).map_err(|e| Error::json(&file.path, e))?;

        let output = self.config.output_dir.join(format!("{}.md", file.stem()));
        let handle = File::create(&output).map_err(|e| Error::io(&output, e))?;
        let mut writer = BufWriter::new(handle);

        let transformed = transform_file(
            records,
            &file.name,
            index,
            &self.normalizer,
            self.config.include_counts,
        );

        let write = |writer: &mut BufWriter<File>| -> std::io::Result<()> {
            for fragment in &transformed.fragments {
                writer.write_all(fragment.as_bytes())?;
                writer.write_all(FRAGMENT_SEPARATOR.as_bytes())?;
            }
            writer.flush()
        };
        write(&mut writer).map_err(|e| Error::io(&output, e))?;

        Ok(FileReport {
            source: file.name.clone(),
            output,
            converted: transformed.converted(),
            dropped: transformed.dropped,
        })
    }
}
