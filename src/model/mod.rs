//! Building model access: a STEP reader plus the element contract the
//! extractor consumes.

pub mod element;
pub mod schema;
pub mod step;
mod step_element;

pub use element::{ElementRecord, ModelElement, PropertySet, Quantity, QuantitySet, Value};
pub use schema::SchemaFamily;
pub use step::{Attr, Entity, StepModel};
pub use step_element::StepElement;
