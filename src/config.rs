use std::path::PathBuf;

/// Paths and switches for one conversion run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of poem JSON files
    pub poem_dir: PathBuf,
    /// Directory of strain JSON files
    pub strain_dir: PathBuf,
    /// Where `<stem>.md` files are written
    pub output_dir: PathBuf,
    /// Keep going after the first output file; when false the run stops
    /// once one Markdown file has been written
    pub all_files: bool,
    /// Append 字数/句数 sections to every poem
    pub include_counts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poem_dir: PathBuf::from("poems"),
            strain_dir: PathBuf::from("strains"),
            output_dir: PathBuf::from("output"),
            all_files: false,
            include_counts: false,
        }
    }
}
