//! Partitioning of a table into labelled, size-bounded chunks.

use crate::error::ChunkingError;
use crate::export::{header_line, row_line};
use crate::extractor::{Cell, Table};
use sha2::{Digest, Sha256};

/// Rows per chunk under the default policy
pub const DEFAULT_MAX_ROWS: usize = 50;
/// Size budget in estimated units (roughly tokens)
pub const DEFAULT_MAX_UNITS: usize = 8000;
/// Payload bytes per estimated unit
pub const DEFAULT_UNIT_DIVISOR: usize = 4;

/// Strategy for bounding chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// Fixed maximum number of rows per chunk
    RowCount(usize),
    /// Accumulate rows while the estimated payload size fits the budget
    SizeEstimate { max_units: usize, unit_divisor: usize },
}

impl ChunkStrategy {
    fn validate(&self) -> Result<(), ChunkingError> {
        match *self {
            ChunkStrategy::RowCount(0) => Err(ChunkingError::InvalidBudget(
                "max rows per chunk must be at least 1".to_string(),
            )),
            ChunkStrategy::SizeEstimate { max_units: 0, .. } => Err(ChunkingError::InvalidBudget(
                "max size units per chunk must be at least 1".to_string(),
            )),
            ChunkStrategy::SizeEstimate { unit_divisor: 0, .. } => Err(
                ChunkingError::InvalidBudget("size unit divisor must be at least 1".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Estimated size units of a payload of `bytes` bytes
pub fn estimate_units(bytes: usize, unit_divisor: usize) -> usize {
    bytes.div_ceil(unit_divisor.max(1))
}

/// One batch of rows from a single category
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub category: String,
    /// 1-based position within the category
    pub index: usize,
    /// Number of chunks in the category
    pub total: usize,
    /// Positions of the rows in the source table
    pub row_indices: Vec<usize>,
    pub rows: Vec<Vec<Cell>>,
    /// CSV text: header line followed by one line per row
    pub payload: String,
    /// The payload alone exceeds the size budget
    pub oversized: bool,
}

impl Chunk {
    pub fn label(&self) -> String {
        format!("{} - Chunk {} of {}", self.category, self.index, self.total)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Sha256 hex digest of the payload
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.payload.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Message text for the `seq`-th (1-based) chunk of a transmission
    pub fn message(&self, prefix: &str, seq: usize) -> String {
        format!("{} {}: {}\n\n{}", prefix, seq, self.label(), self.payload)
    }
}

/// Plans the chunk sequence of a table under one strategy
#[derive(Debug, Clone)]
pub struct TableChunker {
    strategy: ChunkStrategy,
}

impl TableChunker {
    pub fn new(strategy: ChunkStrategy) -> Self {
        Self { strategy }
    }

    /// Create a chunker with default strategy (50 rows per chunk)
    pub fn default_strategy() -> Self {
        Self::new(ChunkStrategy::RowCount(DEFAULT_MAX_ROWS))
    }

    pub fn strategy(&self) -> ChunkStrategy {
        self.strategy
    }

    /// Plan the chunk sequence for a table.
    ///
    /// Categories appear in order of first appearance; rows keep their table
    /// order. The result depends only on the table and the strategy.
    pub fn plan(&self, table: &Table) -> Result<Vec<Chunk>, ChunkingError> {
        self.strategy.validate()?;

        let header = header_line(table)?;
        let mut chunks = Vec::new();

        for (category, indices) in group_by_category(table) {
            let lines = indices
                .iter()
                .map(|&i| row_line(&table.rows()[i]))
                .collect::<Result<Vec<_>, _>>()?;

            let runs = match self.strategy {
                ChunkStrategy::RowCount(max_rows) => (0..lines.len())
                    .collect::<Vec<_>>()
                    .chunks(max_rows)
                    .map(<[usize]>::to_vec)
                    .collect(),
                ChunkStrategy::SizeEstimate {
                    max_units,
                    unit_divisor,
                } => split_by_size(header.len(), &lines, max_units, unit_divisor),
            };

            let total = runs.len();
            for (n, run) in runs.into_iter().enumerate() {
                let mut payload = header.clone();
                for &pos in &run {
                    payload.push_str(&lines[pos]);
                }
                let oversized = match self.strategy {
                    ChunkStrategy::SizeEstimate {
                        max_units,
                        unit_divisor,
                    } => estimate_units(payload.len(), unit_divisor) > max_units,
                    ChunkStrategy::RowCount(_) => false,
                };
                if oversized {
                    tracing::warn!(
                        "{} - Chunk {} of {} exceeds the size budget ({} bytes)",
                        category,
                        n + 1,
                        total,
                        payload.len()
                    );
                }

                let row_indices: Vec<usize> = run.iter().map(|&pos| indices[pos]).collect();
                chunks.push(Chunk {
                    category: category.clone(),
                    index: n + 1,
                    total,
                    rows: row_indices.iter().map(|&i| table.rows()[i].clone()).collect(),
                    row_indices,
                    payload,
                    oversized,
                });
            }
        }

        tracing::debug!("Planned {} chunks for {} rows", chunks.len(), table.len());
        Ok(chunks)
    }
}

impl Default for TableChunker {
    fn default() -> Self {
        Self::default_strategy()
    }
}

/// Row indices per category, categories in order of first appearance
fn group_by_category(table: &Table) -> Vec<(String, Vec<usize>)> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for i in 0..table.len() {
        let category = table.category_of(i);
        match groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, rows)) => rows.push(i),
            None => groups.push((category, vec![i])),
        }
    }
    groups
}

/// Greedy split: a row joins the current run while the run's payload stays
/// within budget. A run is never empty, so a row too large on its own still
/// gets a run of its own.
fn split_by_size(
    header_bytes: usize,
    lines: &[String],
    max_units: usize,
    unit_divisor: usize,
) -> Vec<Vec<usize>> {
    let mut runs = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut bytes = header_bytes;

    for (pos, line) in lines.iter().enumerate() {
        if !current.is_empty() && estimate_units(bytes + line.len(), unit_divisor) > max_units {
            runs.push(std::mem::take(&mut current));
            bytes = header_bytes;
        }
        current.push(pos);
        bytes += line.len();
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}
