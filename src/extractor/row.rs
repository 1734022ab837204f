use super::{
    DESCRIPTION, ELEMENT_TYPE, GLOBAL_ID, LOCATION_X, LOCATION_Y, LOCATION_Z, NAME, OBJECT_TYPE,
    PREDEFINED_TYPE, QUANTITY_PREFIX,
};
use crate::model::{ModelElement, Value};
use std::collections::HashMap;
use std::fmt;

/// One table cell.
///
/// A missing field stays `Absent` until serialization, where it becomes the
/// empty string. `Present` always carries a real value, even an empty text.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Absent,
    Present(Value),
}

impl Cell {
    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Cell::Absent => None,
            Cell::Present(v) => Some(v),
        }
    }

    /// Text form used in CSV payloads
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Absent => Ok(()),
            Cell::Present(v) => v.fmt(f),
        }
    }
}

impl From<Option<Value>> for Cell {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Cell::Absent, Cell::Present)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map(Value::Text).into()
    }
}

/// Sparse column → cell mapping for one element.
///
/// Setting an existing column overwrites its value but keeps the column's
/// original position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, Cell)>,
    index: HashMap<String, usize>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: impl Into<String>, cell: impl Into<Cell>) {
        let column = column.into();
        let cell = cell.into();
        match self.index.get(&column) {
            Some(&i) => self.cells[i].1 = cell,
            None => {
                self.index.insert(column.clone(), self.cells.len());
                self.cells.push((column, cell));
            }
        }
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.index.get(column).map(|&i| &self.cells[i].1)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Take the cell out of a column, leaving `Absent` behind
    pub(crate) fn take(&mut self, column: &str) -> Cell {
        match self.index.get(column) {
            Some(&i) => std::mem::take(&mut self.cells[i].1),
            None => Cell::Absent,
        }
    }
}

/// Which optional sources contribute columns. Identity columns are always
/// extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub placement: bool,
    pub property_sets: bool,
    pub quantities: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            placement: true,
            property_sets: true,
            quantities: true,
        }
    }
}

/// Turns one element into one row
#[derive(Debug, Clone, Copy, Default)]
pub struct RowExtractor {
    options: ExtractOptions,
}

impl RowExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ExtractOptions {
        self.options
    }

    /// Extract a row. Never fails: a source that cannot be resolved simply
    /// contributes nothing (or empty location cells).
    pub fn extract<E: ModelElement + ?Sized>(&self, element: &E) -> Row {
        let mut row = Row::new();

        row.set(ELEMENT_TYPE, Cell::Present(Value::Text(element.type_name())));
        row.set(GLOBAL_ID, element.global_id());
        row.set(NAME, element.name());
        row.set(OBJECT_TYPE, element.object_type());
        row.set(DESCRIPTION, element.description());
        row.set(PREDEFINED_TYPE, element.predefined_type());

        if self.options.placement {
            self.add_placement(element, &mut row);
        }
        if self.options.property_sets {
            self.add_property_sets(element, &mut row);
        }
        if self.options.quantities {
            self.add_quantities(element, &mut row);
        }

        row
    }

    fn add_placement<E: ModelElement + ?Sized>(&self, element: &E, row: &mut Row) {
        let coords = match element.placement() {
            Ok(coords) => coords.map(|c| Cell::Present(Value::Real(c))),
            Err(e) => {
                tracing::trace!("No placement for {:?}: {}", element.global_id(), e);
                [Cell::Absent, Cell::Absent, Cell::Absent]
            }
        };
        let [x, y, z] = coords;
        row.set(LOCATION_X, x);
        row.set(LOCATION_Y, y);
        row.set(LOCATION_Z, z);
    }

    fn add_property_sets<E: ModelElement + ?Sized>(&self, element: &E, row: &mut Row) {
        match element.property_sets() {
            Ok(sets) => {
                for set in sets {
                    for (property, value) in set.properties {
                        row.set(format!("{}.{}", set.name, property), value);
                    }
                }
            }
            Err(e) => tracing::trace!("No property sets for {:?}: {}", element.global_id(), e),
        }
    }

    fn add_quantities<E: ModelElement + ?Sized>(&self, element: &E, row: &mut Row) {
        match element.quantity_sets() {
            Ok(sets) => {
                for quantity in sets.iter().flat_map(|s| &s.quantities) {
                    // same-named quantities from different sets collide; last one wins
                    if let Some(value) = quantity.first_nonzero() {
                        row.set(
                            format!("{}.{}", QUANTITY_PREFIX, quantity.name),
                            Cell::Present(Value::Real(value)),
                        );
                    }
                }
            }
            Err(e) => tracing::trace!("No quantities for {:?}: {}", element.global_id(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use crate::model::{ElementRecord, PropertySet, Quantity, QuantitySet};

    /// Element whose graph lookups all fail
    struct Broken;

    impl ModelElement for Broken {
        fn global_id(&self) -> Option<String> {
            Some("broken".to_string())
        }
        fn type_name(&self) -> String {
            "IfcWall".to_string()
        }
        fn name(&self) -> Option<String> {
            None
        }
        fn object_type(&self) -> Option<String> {
            None
        }
        fn description(&self) -> Option<String> {
            None
        }
        fn predefined_type(&self) -> Option<String> {
            None
        }
        fn placement(&self) -> Result<[f64; 3], FieldError> {
            Err(FieldError::Dangling(7))
        }
        fn property_sets(&self) -> Result<Vec<PropertySet>, FieldError> {
            Err(FieldError::Dangling(8))
        }
        fn quantity_sets(&self) -> Result<Vec<QuantitySet>, FieldError> {
            Err(FieldError::Malformed("bad".to_string()))
        }
    }

    fn text(s: &str) -> Cell {
        Cell::Present(Value::from(s))
    }

    #[test]
    fn test_identity_columns_in_fixed_order() {
        let element = ElementRecord::new("abc", "IfcWall").with_name("Wall A");
        let row = RowExtractor::default().extract(&element);

        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(
            columns,
            vec![
                ELEMENT_TYPE,
                GLOBAL_ID,
                NAME,
                OBJECT_TYPE,
                DESCRIPTION,
                PREDEFINED_TYPE,
                LOCATION_X,
                LOCATION_Y,
                LOCATION_Z
            ]
        );
        assert_eq!(row.get(NAME), Some(&text("Wall A")));
        assert_eq!(row.get(DESCRIPTION), Some(&Cell::Absent));
    }

    #[test]
    fn test_missing_placement_gives_empty_location() {
        let element = ElementRecord::new("abc", "IfcWall");
        let row = RowExtractor::default().extract(&element);

        for column in [LOCATION_X, LOCATION_Y, LOCATION_Z] {
            assert_eq!(row.get(column).map(Cell::render).as_deref(), Some(""));
        }
    }

    #[test]
    fn test_failing_sources_are_local() {
        let row = RowExtractor::default().extract(&Broken);

        assert_eq!(row.len(), 9);
        assert_eq!(row.get(GLOBAL_ID), Some(&text("broken")));
        assert!(row.get(LOCATION_Z).unwrap().is_absent());
    }

    #[test]
    fn test_property_and_quantity_columns() {
        let element = ElementRecord::new("abc", "IfcWall")
            .with_placement(1.0, 2.0, 3.0)
            .with_property_set(
                PropertySet::new("Pset_WallCommon")
                    .with("IsExternal", true)
                    .with("FireRating", "EI 60"),
            )
            .with_quantity_set(QuantitySet {
                name: "Qto_WallBaseQuantities".to_string(),
                quantities: vec![
                    Quantity {
                        length: Some(3.0),
                        volume: Some(0.0),
                        ..Quantity::new("Length")
                    },
                    Quantity::new("Untyped"),
                ],
            });

        let row = RowExtractor::default().extract(&element);

        assert_eq!(row.get(LOCATION_Y).unwrap().render(), "2.0");
        assert_eq!(
            row.get("Pset_WallCommon.IsExternal"),
            Some(&Cell::Present(Value::Bool(true)))
        );
        assert_eq!(row.get("Quantity.Length").unwrap().render(), "3.0");
        assert!(row.get("Quantity.Untyped").is_none());
    }

    #[test]
    fn test_quantity_name_collision_last_write_wins() {
        let set = |value| QuantitySet {
            name: "Qto".to_string(),
            quantities: vec![Quantity {
                area: Some(value),
                ..Quantity::new("NetArea")
            }],
        };
        let element = ElementRecord::new("abc", "IfcSlab")
            .with_quantity_set(set(10.0))
            .with_quantity_set(set(12.5));

        let row = RowExtractor::default().extract(&element);
        assert_eq!(row.get("Quantity.NetArea").unwrap().render(), "12.5");
        assert_eq!(row.columns().filter(|c| *c == "Quantity.NetArea").count(), 1);
    }

    #[test]
    fn test_options_disable_sources() {
        let element = ElementRecord::new("abc", "IfcWall")
            .with_placement(1.0, 2.0, 3.0)
            .with_property_set(PropertySet::new("Pset").with("A", 1i64));
        let extractor = RowExtractor::new(ExtractOptions {
            placement: false,
            property_sets: false,
            quantities: true,
        });

        let row = extractor.extract(&element);
        assert_eq!(row.len(), 6);
        assert!(row.get(LOCATION_X).is_none());
        assert!(row.get("Pset.A").is_none());
    }

    #[test]
    fn test_row_set_keeps_first_position() {
        let mut row = Row::new();
        row.set("a", text("1"));
        row.set("b", text("2"));
        row.set("a", text("3"));

        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&text("3")));
        assert_eq!(row.take("a"), text("3"));
        assert_eq!(row.get("a"), Some(&Cell::Absent));
    }
}
