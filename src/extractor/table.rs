use super::row::{Cell, ExtractOptions, Row, RowExtractor};
use super::{ELEMENT_TYPE, UNCATEGORIZED};
use crate::model::ModelElement;
use rayon::prelude::*;
use std::collections::HashSet;

/// A dense, rectangular table of extracted rows.
///
/// Columns are the union of every row's columns in first-seen order: row
/// by row, and within a row in the row's own column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Materialize sparse rows into one rectangular table
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for row in &rows {
            for column in row.columns() {
                if seen.insert(column) {
                    columns.push(column.to_string());
                }
            }
        }

        let rows = rows
            .into_iter()
            .map(|mut row| columns.iter().map(|c| row.take(c)).collect())
            .collect();

        Self { columns, rows }
    }

    /// Build directly from dense parts; every row must be as wide as `columns`
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// Chunking category of a row: its element type, or `Uncategorized`
    /// when the column is missing or the cell is empty
    pub fn category_of(&self, row: usize) -> String {
        self.cell(row, ELEMENT_TYPE)
            .map(Cell::render)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_string())
    }

    /// Distinct element types in order of first appearance
    pub fn element_types(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        (0..self.len())
            .map(|i| self.category_of(i))
            .filter(|c| seen.insert(c.clone()))
            .collect()
    }
}

/// Applies the row extractor to a sequence of elements
#[derive(Debug, Clone, Copy, Default)]
pub struct TableBuilder {
    extractor: RowExtractor,
    parallel: bool,
}

impl TableBuilder {
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            extractor: RowExtractor::new(options),
            parallel: false,
        }
    }

    /// Extract rows on the rayon pool. Output order is unchanged.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build<E: ModelElement + Sync>(&self, elements: &[E]) -> Table {
        let rows: Vec<Row> = if self.parallel {
            elements
                .par_iter()
                .map(|e| self.extractor.extract(e))
                .collect()
        } else {
            elements.iter().map(|e| self.extractor.extract(e)).collect()
        };

        let table = Table::from_rows(rows);
        tracing::debug!(
            "Built table with {} rows and {} columns",
            table.len(),
            table.columns().len()
        );
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementRecord, PropertySet, Value};

    fn elements() -> Vec<ElementRecord> {
        vec![
            ElementRecord::new("w1", "IfcWall")
                .with_property_set(PropertySet::new("Pset_WallCommon").with("IsExternal", true)),
            ElementRecord::new("d1", "IfcDoor")
                .with_property_set(PropertySet::new("Pset_DoorCommon").with("FireRating", "EI 30")),
            ElementRecord::new("w2", "IfcWall").with_placement(0.0, 1.0, 2.0),
        ]
    }

    #[test]
    fn test_union_of_columns_first_seen() {
        let table = TableBuilder::default().build(&elements());

        let columns = table.columns();
        assert_eq!(columns.len(), 11);
        assert_eq!(columns[0], ELEMENT_TYPE);
        assert_eq!(columns[9], "Pset_WallCommon.IsExternal");
        assert_eq!(columns[10], "Pset_DoorCommon.FireRating");
    }

    #[test]
    fn test_table_is_rectangular() {
        let table = TableBuilder::default().build(&elements());
        assert!(table.rows().iter().all(|r| r.len() == table.columns().len()));
        assert_eq!(table.cell(2, "Pset_DoorCommon.FireRating"), Some(&Cell::Absent));
        assert_eq!(
            table.cell(1, "Pset_DoorCommon.FireRating"),
            Some(&Cell::Present(Value::from("EI 30")))
        );
    }

    #[test]
    fn test_parallel_build_matches_sequential() {
        let elements: Vec<ElementRecord> = (0..200)
            .map(|i| {
                ElementRecord::new(format!("g{}", i), if i % 3 == 0 { "IfcDoor" } else { "IfcWall" })
                    .with_property_set(PropertySet::new(format!("Pset_{}", i % 7)).with("N", i as i64))
            })
            .collect();

        let sequential = TableBuilder::default().build(&elements);
        let parallel = TableBuilder::default().parallel(true).build(&elements);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_element_types_and_categories() {
        let table = TableBuilder::default().build(&elements());
        assert_eq!(table.element_types(), vec!["IfcWall", "IfcDoor"]);
        assert_eq!(table.category_of(1), "IfcDoor");

        let blank = Table::from_rows(vec![Row::new()]);
        assert_eq!(blank.category_of(0), UNCATEGORIZED);
    }

    #[test]
    fn test_empty_input() {
        let table = TableBuilder::default().build::<ElementRecord>(&[]);
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }
}
