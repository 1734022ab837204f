use crate::chunker::{Chunk, TableChunker};
use crate::config::Config;
use crate::error::Result;
use crate::extractor::{Table, TableBuilder};
use crate::model::{ModelElement, StepModel};
use crate::transmit::{BatchTransmitter, TransmissionReport, transmit_chunks};
use std::path::Path;
use std::time::Instant;

/// Everything one pass over a model produces
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub table: Table,
    pub chunks: Vec<Chunk>,
}

/// Read → extract → build table → plan chunks, driven by one [`Config`].
///
/// Holds no state between calls: the same input always gives the same
/// output, so a failed transmission can be retried by re-running the plan.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open a model file. Failure here is fatal for the run.
    pub fn load_model(&self, path: impl AsRef<Path>) -> Result<StepModel> {
        Ok(StepModel::open(path)?)
    }

    fn builder(&self) -> TableBuilder {
        TableBuilder::new(self.config.extraction.options()).parallel(self.config.extraction.parallel)
    }

    /// Table of the configured category's elements, in model order
    pub fn extract(&self, model: &StepModel) -> Table {
        let elements = model.elements_of(&self.config.extraction.category);
        tracing::info!(
            "Extracting {} {} elements",
            elements.len(),
            self.config.extraction.category
        );
        self.builder().build(&elements)
    }

    /// Table of arbitrary elements, in the given order
    pub fn extract_elements<E: ModelElement + Sync>(&self, elements: &[E]) -> Table {
        self.builder().build(elements)
    }

    pub fn plan(&self, table: &Table) -> Result<Vec<Chunk>> {
        let chunker = TableChunker::new(self.config.chunking.strategy());
        Ok(chunker.plan(table)?)
    }

    pub fn run_model(&self, model: &StepModel) -> Result<PipelineOutput> {
        let table = self.extract(model);
        let chunks = self.plan(&table)?;
        Ok(PipelineOutput { table, chunks })
    }

    /// Full pass over a model file
    pub fn run(&self, path: impl AsRef<Path>) -> Result<PipelineOutput> {
        let start = Instant::now();
        let model = self.load_model(path)?;
        let output = self.run_model(&model)?;
        tracing::info!(
            "Pipeline finished: {} rows, {} columns, {} chunks in {} ms",
            output.table.len(),
            output.table.columns().len(),
            output.chunks.len(),
            start.elapsed().as_millis()
        );
        Ok(output)
    }

    /// Send planned chunks from `start_at` on, paced by the configured delay
    pub async fn transmit<T: BatchTransmitter + ?Sized>(
        &self,
        transmitter: &T,
        destination: &str,
        chunks: &[Chunk],
        start_at: usize,
    ) -> Result<TransmissionReport> {
        let options = self.config.transmission.options(start_at);
        Ok(transmit_chunks(transmitter, destination, chunks, &options).await?)
    }
}
