use crate::error::FieldError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar attribute or property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(v) => write!(f, "{}", v),
            // integral reals keep one decimal
            Value::Real(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            Value::Real(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// A named group of properties attached to an element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertySet {
    pub name: String,
    /// Property name and value; `None` when the property is declared without a value
    pub properties: Vec<(String, Option<Value>)>,
}

impl PropertySet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name.into(), Some(value.into()));
        self
    }

    /// Insert or overwrite a property, keeping its first position
    pub fn set(&mut self, name: String, value: Option<Value>) {
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((name, value)),
        }
    }

    /// Overlay another set of the same name on top of this one
    pub fn merge(&mut self, other: PropertySet) {
        for (name, value) in other.properties {
            self.set(name, value);
        }
    }
}

/// One measured quantity.
///
/// The quantity kind is not tagged; each slot is filled only when the source
/// exposes that measure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Quantity {
    pub name: String,
    pub length: Option<f64>,
    pub area: Option<f64>,
    pub volume: Option<f64>,
    pub height: Option<f64>,
}

impl Quantity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// First present, non-zero measure in the fixed order
    /// length, area, volume, height.
    ///
    /// A zero length with a non-zero area therefore reports the area. This
    /// mirrors how quantity values have always been picked and is kept as a
    /// known ambiguity.
    pub fn first_nonzero(&self) -> Option<f64> {
        [self.length, self.area, self.volume, self.height]
            .into_iter()
            .flatten()
            .find(|v| *v != 0.0)
    }
}

/// A quantity collection reached through a defines-by-properties relation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuantitySet {
    pub name: String,
    pub quantities: Vec<Quantity>,
}

/// Read access to one element of a model graph.
///
/// Optional attributes are `None` when absent. The three graph lookups are
/// independent fallible operations; a failure in one never affects the others.
pub trait ModelElement {
    fn global_id(&self) -> Option<String>;

    /// Type discriminator, e.g. `IfcWall`
    fn type_name(&self) -> String;

    fn name(&self) -> Option<String>;

    fn object_type(&self) -> Option<String>;

    fn description(&self) -> Option<String>;

    /// `None` when unset or when the element's type has no such attribute
    fn predefined_type(&self) -> Option<String>;

    /// Local placement coordinates, not resolved to world coordinates
    fn placement(&self) -> Result<[f64; 3], FieldError>;

    fn property_sets(&self) -> Result<Vec<PropertySet>, FieldError>;

    fn quantity_sets(&self) -> Result<Vec<QuantitySet>, FieldError>;
}

/// An owned element, for sources that are not STEP files and for tests
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementRecord {
    pub global_id: Option<String>,
    pub type_name: String,
    pub name: Option<String>,
    pub object_type: Option<String>,
    pub description: Option<String>,
    pub predefined_type: Option<String>,
    pub placement: Option<[f64; 3]>,
    pub property_sets: Vec<PropertySet>,
    pub quantity_sets: Vec<QuantitySet>,
}

impl ElementRecord {
    pub fn new(global_id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            global_id: Some(global_id.into()),
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_placement(mut self, x: f64, y: f64, z: f64) -> Self {
        self.placement = Some([x, y, z]);
        self
    }

    pub fn with_property_set(mut self, set: PropertySet) -> Self {
        self.property_sets.push(set);
        self
    }

    pub fn with_quantity_set(mut self, set: QuantitySet) -> Self {
        self.quantity_sets.push(set);
        self
    }
}

impl ModelElement for ElementRecord {
    fn global_id(&self) -> Option<String> {
        self.global_id.clone()
    }

    fn type_name(&self) -> String {
        self.type_name.clone()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn object_type(&self) -> Option<String> {
        self.object_type.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn predefined_type(&self) -> Option<String> {
        self.predefined_type.clone()
    }

    fn placement(&self) -> Result<[f64; 3], FieldError> {
        self.placement.ok_or(FieldError::Absent("ObjectPlacement"))
    }

    fn property_sets(&self) -> Result<Vec<PropertySet>, FieldError> {
        Ok(self.property_sets.clone())
    }

    fn quantity_sets(&self) -> Result<Vec<QuantitySet>, FieldError> {
        Ok(self.quantity_sets.clone())
    }
}
