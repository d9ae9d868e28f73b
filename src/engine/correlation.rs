use tracing::{debug, info};

use crate::models::correlation::{CorrelationTable, FileRegistry};

/// What one commit added to the accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoldStats {
    pub new_files: usize,
    pub new_pairs: usize,
    /// Sum of all count increments, `n * (n - 1)` for `n` files.
    pub increments: u64,
}

/// Folds commits into a file registry and a co-occurrence table.
#[derive(Debug, Default)]
pub struct Correlator {
    registry: FileRegistry,
    table: CorrelationTable,
    commits: usize,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one commit's distinct files.
    ///
    /// Every ordered pair `(f, g)` with `f != g` bumps the symmetric count by
    /// one, so a pair that changes together gains 2 per commit. Downstream
    /// consumers of the artifact rely on that weighting.
    pub fn fold(&mut self, files: &[String]) -> FoldStats {
        let mut stats = FoldStats::default();
        self.commits += 1;

        for f in files {
            if self.registry.insert(f) {
                info!("noting file: {f}");
                stats.new_files += 1;
            }

            for g in files {
                if f == g {
                    continue;
                }
                if self.table.record(f, g, 1) {
                    debug!("correlation: {f} <-> {g}");
                    stats.new_pairs += 1;
                }
                stats.increments += 1;
            }
        }

        stats
    }

    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    pub fn table(&self) -> &CorrelationTable {
        &self.table
    }

    /// Number of commits folded so far, empty ones included.
    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn into_parts(self) -> (FileRegistry, CorrelationTable) {
        (self.registry, self.table)
    }
}
