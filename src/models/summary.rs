use camino::Utf8PathBuf;
use serde::Serialize;

/// Result of a learning run.
#[derive(Debug, Clone, Serialize)]
pub struct LearnSummary {
    /// Number of commits folded into the table
    pub commits_analyzed: usize,
    /// Distinct files seen
    pub files: usize,
    /// Distinct unordered file pairs
    pub pairs: usize,
    /// Where the table was written
    pub artifact: Utf8PathBuf,
}
