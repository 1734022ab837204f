use crate::error::Result;
use crate::model::{ModelElement, StepModel};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Count of elements of one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementCount {
    pub element_type: String,
    pub count: usize,
}

/// Overview of a loaded model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub file_name: String,
    /// File size in kilobytes
    pub file_size_kb: f64,
    pub schema: String,
    /// Project creation date (`YYYY-MM-DD`), `N/A` when unknown
    pub creation_date: String,
    /// Sha256 of the model text
    pub content_digest: String,
    pub sites: usize,
    pub buildings: usize,
    pub storeys: usize,
    pub total_elements: usize,
    /// Sorted by count descending, then by type name
    pub element_counts: Vec<ElementCount>,
}

impl ModelSummary {
    /// Summarize a model that was read from `path`
    pub fn from_file(model: &StepModel, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(model, file_name, size))
    }

    pub fn new(model: &StepModel, file_name: impl Into<String>, size_bytes: u64) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for element in model.products() {
            *counts.entry(element.type_name()).or_default() += 1;
        }
        let mut element_counts: Vec<ElementCount> = counts
            .into_iter()
            .map(|(element_type, count)| ElementCount {
                element_type,
                count,
            })
            .collect();
        element_counts.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.element_type.cmp(&b.element_type))
        });

        Self {
            file_name: file_name.into(),
            file_size_kb: size_bytes as f64 / 1024.0,
            schema: model.schema().to_string(),
            creation_date: creation_date(model).unwrap_or_else(|| "N/A".to_string()),
            content_digest: model.content_digest().to_string(),
            sites: model.by_type("IfcSite").count(),
            buildings: model.by_type("IfcBuilding").count(),
            storeys: model.by_type("IfcBuildingStorey").count(),
            total_elements: element_counts.iter().map(|c| c.count).sum(),
            element_counts,
        }
    }
}

/// Owner history timestamp of the first project
fn creation_date(model: &StepModel) -> Option<String> {
    let project = model.by_type("IfcProject").next()?;
    let history = model.resolve(project.attr(1), "OwnerHistory").ok()?;
    let seconds = history.attr(7).and_then(|a| a.as_float())? as i64;
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File:          {}", self.file_name)?;
        writeln!(f, "Size:          {:.2} KB", self.file_size_kb)?;
        writeln!(f, "Schema:        {}", self.schema)?;
        writeln!(f, "Created:       {}", self.creation_date)?;
        writeln!(f, "Digest:        {}", self.content_digest)?;
        writeln!(f, "Sites:         {}", self.sites)?;
        writeln!(f, "Buildings:     {}", self.buildings)?;
        writeln!(f, "Storeys:       {}", self.storeys)?;
        writeln!(f, "Elements:      {}", self.total_elements)?;
        for count in &self.element_counts {
            writeln!(f, "  {:<32} {:>6}", count.element_type, count.count)?;
        }
        Ok(())
    }
}
