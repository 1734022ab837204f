use super::table::Table;
use super::ELEMENT_TYPE;

/// Row and column selection over a built table.
///
/// Filters run in a fixed order: element types, then search, then columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter {
    /// Keep rows of these element types (all rows when empty)
    pub element_types: Vec<String>,
    /// Case-insensitive substring matched against every cell
    pub search: Option<String>,
    /// Keep only these columns, in this order (all columns when empty)
    pub columns: Vec<String>,
}

impl TableFilter {
    pub fn is_empty(&self) -> bool {
        self.element_types.is_empty()
            && self.search.as_deref().is_none_or(str::is_empty)
            && self.columns.is_empty()
    }

    pub fn apply(&self, table: &Table) -> Table {
        let mut result = table.clone();
        if !self.element_types.is_empty() {
            result = result.retain_types(&self.element_types);
        }
        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            result = result.search(term);
        }
        if !self.columns.is_empty() {
            result = result.select_columns(&self.columns);
        }
        result
    }
}

impl Table {
    fn retain_rows(&self, keep: impl Fn(usize) -> bool) -> Table {
        let rows = (0..self.len())
            .filter(|&i| keep(i))
            .map(|i| self.rows()[i].clone())
            .collect();
        Table::from_parts(self.columns().to_vec(), rows)
    }

    /// Rows where any cell contains `term`, ignoring case
    pub fn search(&self, term: &str) -> Table {
        let needle = term.to_lowercase();
        self.retain_rows(|i| {
            self.rows()[i]
                .iter()
                .any(|cell| cell.render().to_lowercase().contains(&needle))
        })
    }

    /// Rows whose element type is one of `types`, ignoring ASCII case
    pub fn retain_types<S: AsRef<str>>(&self, types: &[S]) -> Table {
        let Some(col) = self.column_index(ELEMENT_TYPE) else {
            return Table::from_parts(self.columns().to_vec(), Vec::new());
        };
        self.retain_rows(|i| {
            let value = self.rows()[i][col].render();
            types.iter().any(|t| t.as_ref().eq_ignore_ascii_case(&value))
        })
    }

    /// Project onto the named columns in the given order. Unknown names are
    /// skipped, as are repeats.
    pub fn select_columns<S: AsRef<str>>(&self, columns: &[S]) -> Table {
        let mut picked: Vec<usize> = Vec::new();
        for name in columns {
            if let Some(i) = self.column_index(name.as_ref())
                && !picked.contains(&i)
            {
                picked.push(i);
            }
        }

        let names = picked.iter().map(|&i| self.columns()[i].clone()).collect();
        let rows = self
            .rows()
            .iter()
            .map(|row| picked.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Table::from_parts(names, rows)
    }
}
