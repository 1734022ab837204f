//! Flattening of model elements into one tabular view.
//!
//! Each element becomes a sparse [`Row`]; the [`TableBuilder`] then
//! reconciles the rows' column sets into a single rectangular [`Table`].

pub mod filter;
pub mod row;
pub mod table;

pub use filter::TableFilter;
pub use row::{Cell, ExtractOptions, Row, RowExtractor};
pub use table::{Table, TableBuilder};

pub const ELEMENT_TYPE: &str = "ElementType";
pub const GLOBAL_ID: &str = "GlobalId";
pub const NAME: &str = "Name";
pub const OBJECT_TYPE: &str = "ObjectType";
pub const DESCRIPTION: &str = "Description";
pub const PREDEFINED_TYPE: &str = "PredefinedType";
pub const LOCATION_X: &str = "LocationX";
pub const LOCATION_Y: &str = "LocationY";
pub const LOCATION_Z: &str = "LocationZ";

/// Prefix of quantity columns, `Quantity.<name>`
pub const QUANTITY_PREFIX: &str = "Quantity";

/// Category of rows without an element type
pub const UNCATEGORIZED: &str = "Uncategorized";
