//! # ifcwise - IFC element tables and chunk planning
//!
//! Reads IFC building models (ISO 10303-21 STEP files), flattens their elements
//! into one rectangular table, and splits that table into labelled,
//! size-bounded chunks ready to hand to a text-oriented consumer such as a
//! conversational AI backend.
//!
//! ## Overview
//!
//! Each element contributes one row built from four independent sources:
//! identity attributes, local placement, property sets, and quantities. A
//! source that cannot be resolved contributes empty cells and never aborts
//! the row. Rows are reconciled into one table whose columns are the union of
//! all rows' columns, then partitioned per element category under a row-count
//! or estimated-size budget.
//!
//! ## Architecture
//!
//! ```text
//! StepModel ──► RowExtractor ──► TableBuilder ──► TableChunker ──► BatchTransmitter
//!  (model)      (per element)     (one table)     (chunk plan)      (collaborator)
//! ```
//!
//! ## Modules
//!
//! - [`model`]: STEP reader and the element access contract
//! - [`extractor`]: row extraction, table building and filtering
//! - [`chunker`]: chunk planning under a row-count or size budget
//! - [`export`]: CSV and JSON serialization of tables
//! - [`transmit`]: batch transmitter interface and paced sending
//! - [`summary`]: model overview (schema, creation date, element counts)
//! - [`pipeline`]: the end-to-end pass driven by [`config::Config`]
//! - [`config`]: configuration management with environment variable support
//! - [`error`]: error types and result aliases
//! - [`paths`]: platform directories
//!
//! ## Usage Example
//!
//! ```no_run
//! use ifcwise::{Config, Pipeline};
//!
//! fn main() -> ifcwise::Result<()> {
//!     let pipeline = Pipeline::new(Config::new()?);
//!     let output = pipeline.run("model.ifc")?;
//!
//!     for chunk in &output.chunks {
//!         println!("{} ({} rows)", chunk.label(), chunk.row_count());
//!     }
//!     Ok(())
//! }
//! ```

/// Chunk planning: category grouping and budgeted splitting
pub mod chunker;

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// CSV and JSON serialization of tables
pub mod export;

/// Row extraction, table building and filtering
pub mod extractor;

/// STEP model reader and element access
pub mod model;

/// Platform-specific path computation
pub mod paths;

/// End-to-end extraction and chunking pass
pub mod pipeline;

/// Model overview for the `info` command
pub mod summary;

/// Batch transmitter interface and paced sending
pub mod transmit;

pub use chunker::{Chunk, ChunkStrategy, TableChunker};
pub use config::Config;
pub use error::{IfcWiseError, Result};
pub use extractor::{Cell, Table, TableBuilder};
pub use model::{ModelElement, StepModel};
pub use pipeline::{Pipeline, PipelineOutput};
pub use transmit::{BatchTransmitter, DirectoryTransmitter};
