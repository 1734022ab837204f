//! `ModelElement` over a parsed STEP model.
//!
//! Attribute positions follow the IfcRoot / IfcObject / IfcProduct layout
//! shared by IFC2X3 and IFC4.

use super::element::{ModelElement, PropertySet, Quantity, QuantitySet, Value};
use super::schema;
use super::step::{Attr, Entity, StepModel};
use crate::error::FieldError;

const GLOBAL_ID: usize = 0;
const NAME: usize = 2;
const DESCRIPTION: usize = 3;
const OBJECT_TYPE: usize = 4;
const OBJECT_PLACEMENT: usize = 5;

/// An element entity together with the model it belongs to
#[derive(Debug, Clone, Copy)]
pub struct StepElement<'m> {
    model: &'m StepModel,
    entity: &'m Entity,
}

impl<'m> StepElement<'m> {
    pub fn new(model: &'m StepModel, entity: &'m Entity) -> Self {
        Self { model, entity }
    }

    pub fn id(&self) -> u64 {
        self.entity.id
    }

    pub fn entity(&self) -> &'m Entity {
        self.entity
    }

    fn relations(&self, type_name: &'static str) -> Result<Vec<&'m Entity>, FieldError> {
        self.model
            .relations_of(self.entity.id)
            .iter()
            .map(|id| self.model.entity(*id).ok_or(FieldError::Dangling(*id)))
            .filter(|rel| rel.as_ref().map_or(true, |r| r.is_a(type_name)))
            .collect()
    }

    /// Targets of a defines-by-properties relation (single or set-valued)
    fn definitions(&self, rel: &'m Entity) -> Result<Vec<&'m Entity>, FieldError> {
        let target = rel
            .attr(5)
            .ok_or(FieldError::Absent("RelatingPropertyDefinition"))?;
        match target.as_list() {
            Some(items) => items
                .iter()
                .map(|item| self.model.resolve(Some(item), "RelatingPropertyDefinition"))
                .collect(),
            None => Ok(vec![self.model.resolve(Some(target), "RelatingPropertyDefinition")?]),
        }
    }

    fn read_definition(&self, def: &Entity) -> Result<Option<PropertySet>, FieldError> {
        let Some(name) = def.text(2) else {
            return Ok(None);
        };

        if def.is_a("IFCPROPERTYSET") {
            let mut set = PropertySet::new(name);
            for prop in self.refs(def.attr(4), "HasProperties")? {
                if let Some((prop_name, value)) = read_property(prop) {
                    set.set(prop_name, value);
                }
            }
            Ok(Some(set))
        } else if def.is_a("IFCELEMENTQUANTITY") {
            let mut set = PropertySet::new(name);
            for quantity in self.refs(def.attr(5), "Quantities")? {
                if let Some(quantity_name) = quantity.text(0)
                    && is_simple_quantity(quantity)
                {
                    set.set(quantity_name, quantity.attr(3).and_then(scalar));
                }
            }
            Ok(Some(set))
        } else {
            Ok(None)
        }
    }

    fn refs(&self, attr: Option<&Attr>, what: &'static str) -> Result<Vec<&'m Entity>, FieldError> {
        let Some(items) = attr.and_then(Attr::as_list) else {
            return Ok(Vec::new());
        };
        items
            .iter()
            .map(|item| self.model.resolve(Some(item), what))
            .collect()
    }
}

fn is_simple_quantity(entity: &Entity) -> bool {
    [
        "IFCQUANTITYLENGTH",
        "IFCQUANTITYAREA",
        "IFCQUANTITYVOLUME",
        "IFCQUANTITYCOUNT",
        "IFCQUANTITYWEIGHT",
        "IFCQUANTITYTIME",
    ]
    .iter()
    .any(|t| entity.is_a(t))
}

/// Convert an attribute to a scalar, unwrapping typed parameters
fn scalar(attr: &Attr) -> Option<Value> {
    match attr {
        Attr::Typed(_, inner) => scalar(inner),
        Attr::String(s) => Some(Value::Text(s.clone())),
        Attr::Integer(v) => Some(Value::Integer(*v)),
        Attr::Real(v) => Some(Value::Real(*v)),
        Attr::Enum(e) => Some(match e.as_str() {
            "T" => Value::Bool(true),
            "F" => Value::Bool(false),
            "U" => Value::Text("UNKNOWN".to_string()),
            other => Value::Text(other.to_string()),
        }),
        Attr::List(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar).map(|v| v.to_string()).collect();
            Some(Value::Text(parts.join(", ")))
        }
        Attr::Null | Attr::Derived | Attr::Ref(_) | Attr::Binary(_) => None,
    }
}

fn read_property(prop: &Entity) -> Option<(String, Option<Value>)> {
    let name = prop.text(0)?;
    // NominalValue, EnumerationValues and ListValues all sit at index 2
    let supported = ["IFCPROPERTYSINGLEVALUE", "IFCPROPERTYENUMERATEDVALUE", "IFCPROPERTYLISTVALUE"];
    supported
        .iter()
        .any(|t| prop.is_a(t))
        .then(|| (name, prop.attr(2).and_then(scalar)))
}

impl ModelElement for StepElement<'_> {
    fn global_id(&self) -> Option<String> {
        self.entity.text(GLOBAL_ID)
    }

    fn type_name(&self) -> String {
        schema::canonical_type_name(&self.entity.type_name)
    }

    fn name(&self) -> Option<String> {
        self.entity.text(NAME)
    }

    fn object_type(&self) -> Option<String> {
        self.entity.text(OBJECT_TYPE)
    }

    fn description(&self) -> Option<String> {
        self.entity.text(DESCRIPTION)
    }

    fn predefined_type(&self) -> Option<String> {
        let index =
            schema::predefined_type_index(&self.entity.type_name, self.model.schema_family())?;
        self.entity.text(index)
    }

    fn placement(&self) -> Result<[f64; 3], FieldError> {
        let local = self
            .model
            .resolve(self.entity.attr(OBJECT_PLACEMENT), "ObjectPlacement")?;
        if !local.is_a("IFCLOCALPLACEMENT") {
            return Err(FieldError::UnexpectedType {
                expected: "IfcLocalPlacement",
                found: local.type_name.clone(),
            });
        }
        let axis = self.model.resolve(local.attr(1), "RelativePlacement")?;
        let point = self.model.resolve(axis.attr(0), "Location")?;
        let coords = point
            .attr(0)
            .and_then(Attr::as_list)
            .ok_or(FieldError::Absent("Coordinates"))?;

        match coords {
            [x, y, z, ..] => {
                let read = |a: &Attr| {
                    a.as_float()
                        .ok_or_else(|| FieldError::Malformed("non-numeric coordinate".to_string()))
                };
                Ok([read(x)?, read(y)?, read(z)?])
            }
            _ => Err(FieldError::Malformed(format!(
                "expected 3 coordinates, found {}",
                coords.len()
            ))),
        }
    }

    fn property_sets(&self) -> Result<Vec<PropertySet>, FieldError> {
        let mut sets: Vec<PropertySet> = Vec::new();
        let mut add = |set: PropertySet| match sets.iter_mut().find(|s| s.name == set.name) {
            Some(existing) => existing.merge(set),
            None => sets.push(set),
        };

        // type object sets first so occurrence values win
        for rel in self.relations("IFCRELDEFINESBYTYPE")? {
            let type_object = self.model.resolve(rel.attr(5), "RelatingType")?;
            for def in self.refs(type_object.attr(5), "HasPropertySets")? {
                if let Some(set) = self.read_definition(def)? {
                    add(set);
                }
            }
        }

        for rel in self.relations("IFCRELDEFINESBYPROPERTIES")? {
            for def in self.definitions(rel)? {
                if let Some(set) = self.read_definition(def)? {
                    add(set);
                }
            }
        }

        Ok(sets)
    }

    fn quantity_sets(&self) -> Result<Vec<QuantitySet>, FieldError> {
        let mut sets = Vec::new();
        for rel in self.relations("IFCRELDEFINESBYPROPERTIES")? {
            for def in self.definitions(rel)? {
                if !def.is_a("IFCELEMENTQUANTITY") {
                    continue;
                }
                let mut set = QuantitySet {
                    name: def.text(2).unwrap_or_default(),
                    quantities: Vec::new(),
                };
                for entity in self.refs(def.attr(5), "Quantities")? {
                    let Some(name) = entity.text(0) else {
                        continue;
                    };
                    let value = entity.attr(3).and_then(Attr::as_float);
                    let mut quantity = Quantity::new(name);
                    if entity.is_a("IFCQUANTITYLENGTH") {
                        quantity.length = value;
                    } else if entity.is_a("IFCQUANTITYAREA") {
                        quantity.area = value;
                    } else if entity.is_a("IFCQUANTITYVOLUME") {
                        quantity.volume = value;
                    }
                    set.quantities.push(quantity);
                }
                sets.push(set);
            }
        }
        Ok(sets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(data: &str) -> StepModel {
        let text = format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n{}\nENDSEC;\nEND-ISO-10303-21;\n",
            data
        );
        StepModel::parse(&text).unwrap()
    }

    const PLACED_WALL: &str = "\
#1=IFCCARTESIANPOINT((1000.,2000.,0.));
#2=IFCAXIS2PLACEMENT3D(#1,$,$);
#3=IFCLOCALPLACEMENT($,#2);
#10=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,'Wall A','Exterior','Basic Wall',#3,$,'W1',.SOLIDWALL.);";

    #[test]
    fn test_identity_attributes() {
        let model = model(PLACED_WALL);
        let wall = model.products().next().unwrap();
        assert_eq!(wall.global_id().as_deref(), Some("2O2Fr$t4X7Zf8NOew3FLOH"));
        assert_eq!(wall.type_name(), "IfcWall");
        assert_eq!(wall.name().as_deref(), Some("Wall A"));
        assert_eq!(wall.description().as_deref(), Some("Exterior"));
        assert_eq!(wall.object_type().as_deref(), Some("Basic Wall"));
        assert_eq!(wall.predefined_type().as_deref(), Some("SOLIDWALL"));
    }

    #[test]
    fn test_structural_member_predefined_type() {
        let model = model(
            "#10=IFCSTRUCTURALCURVEMEMBER('s',$,$,$,$,$,$,.RIGID_JOINED_MEMBER.,$);\n\
             #11=IFCSTRUCTURALSURFACEMEMBER('p',$,$,$,$,$,$,.SHELL.,0.2);",
        );
        let members: Vec<StepElement<'_>> = model.products().collect();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].type_name(), "IfcStructuralCurveMember");
        assert_eq!(members[0].predefined_type().as_deref(), Some("RIGID_JOINED_MEMBER"));
        assert_eq!(members[1].predefined_type().as_deref(), Some("SHELL"));
    }

    #[test]
    fn test_placement_chain() {
        let model = model(PLACED_WALL);
        let wall = model.products().next().unwrap();
        assert_eq!(wall.placement(), Ok([1000.0, 2000.0, 0.0]));
    }

    #[test]
    fn test_placement_absent() {
        let model = model("#10=IFCWALL('g',$,$,$,$,$,$,$,$);");
        let wall = model.products().next().unwrap();
        assert_eq!(wall.placement(), Err(FieldError::Absent("ObjectPlacement")));
    }

    #[test]
    fn test_placement_two_dimensional_point_fails() {
        let model = model(
            "#1=IFCCARTESIANPOINT((5.,5.));\n#2=IFCAXIS2PLACEMENT2D(#1,$);\n\
             #3=IFCLOCALPLACEMENT($,#2);\n#10=IFCSLAB('g',$,$,$,$,#3,$,$,.FLOOR.);",
        );
        let slab = model.products().next().unwrap();
        assert!(matches!(slab.placement(), Err(FieldError::Malformed(_))));
    }

    #[test]
    fn test_placement_dangling_reference() {
        let model = model("#3=IFCLOCALPLACEMENT($,#77);\n#10=IFCWALL('g',$,$,$,$,#3,$,$,$);");
        let wall = model.products().next().unwrap();
        assert_eq!(wall.placement(), Err(FieldError::Dangling(77)));
    }

    #[test]
    fn test_property_sets_with_type_override() {
        let model = model(
            "#10=IFCDOOR('d',$,'Door',$,$,$,$,$,2100.,900.,.DOOR.,$,$);\n\
             #20=IFCPROPERTYSINGLEVALUE('Reference',$,IFCIDENTIFIER('T1'),$);\n\
             #21=IFCPROPERTYSINGLEVALUE('FireRating',$,IFCLABEL('EI 30'),$);\n\
             #22=IFCPROPERTYSET('p1',$,'Pset_DoorCommon',$,(#20,#21));\n\
             #23=IFCDOORTYPE('t',$,'Type',$,$,(#22),$,$,$,.DOOR.,$,.F.,$);\n\
             #24=IFCRELDEFINESBYTYPE('r1',$,$,$,(#10),#23);\n\
             #30=IFCPROPERTYSINGLEVALUE('FireRating',$,IFCLABEL('EI 60'),$);\n\
             #31=IFCPROPERTYSINGLEVALUE('Remark',$,$,$);\n\
             #32=IFCPROPERTYSET('p2',$,'Pset_DoorCommon',$,(#30,#31));\n\
             #33=IFCRELDEFINESBYPROPERTIES('r2',$,$,$,(#10),#32);",
        );
        let door = model.products().next().unwrap();
        assert_eq!(door.predefined_type().as_deref(), Some("DOOR"));

        let sets = door.property_sets().unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(
            sets[0].properties,
            vec![
                ("Reference".to_string(), Some(Value::from("T1"))),
                ("FireRating".to_string(), Some(Value::from("EI 60"))),
                ("Remark".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_quantities_from_element_quantity() {
        let model = model(
            "#10=IFCWALL('g',$,$,$,$,$,$,$,$);\n\
             #20=IFCQUANTITYLENGTH('Length',$,$,5000.,$);\n\
             #21=IFCQUANTITYAREA('NetSideArea',$,$,15.,$);\n\
             #22=IFCQUANTITYCOUNT('Openings',$,$,2,$);\n\
             #23=IFCELEMENTQUANTITY('q',$,'Qto_WallBaseQuantities',$,$,(#20,#21,#22));\n\
             #24=IFCRELDEFINESBYPROPERTIES('r',$,$,$,(#10),#23);",
        );
        let wall = model.products().next().unwrap();

        let sets = wall.quantity_sets().unwrap();
        assert_eq!(sets.len(), 1);
        let values: Vec<Option<f64>> = sets[0].quantities.iter().map(Quantity::first_nonzero).collect();
        assert_eq!(values, vec![Some(5000.0), Some(15.0), None]);

        // quantity collections are reported as property sets too
        let psets = wall.property_sets().unwrap();
        assert_eq!(psets[0].name, "Qto_WallBaseQuantities");
        assert_eq!(psets[0].properties[2], ("Openings".to_string(), Some(Value::Integer(2))));
    }

    #[test]
    fn test_property_set_dangling_reference_fails_source() {
        let model = model(
            "#10=IFCWALL('g',$,$,$,$,$,$,$,$);\n\
             #22=IFCPROPERTYSET('p',$,'Pset_WallCommon',$,(#99));\n\
             #23=IFCRELDEFINESBYPROPERTIES('r',$,$,$,(#10),#22);",
        );
        let wall = model.products().next().unwrap();
        assert_eq!(wall.property_sets(), Err(FieldError::Dangling(99)));
        assert_eq!(wall.quantity_sets(), Ok(Vec::new()));
    }

    #[test]
    fn test_enumerated_value_joined() {
        let model = model(
            "#10=IFCWALL('g',$,$,$,$,$,$,$,$);\n\
             #20=IFCPROPERTYENUMERATEDVALUE('Status',$,(IFCLABEL('NEW'),IFCLABEL('TEMPORARY')),$);\n\
             #22=IFCPROPERTYSET('p',$,'Pset_WallCommon',$,(#20));\n\
             #23=IFCRELDEFINESBYPROPERTIES('r',$,$,$,(#10),#22);",
        );
        let wall = model.products().next().unwrap();
        let sets = wall.property_sets().unwrap();
        assert_eq!(
            sets[0].properties[0].1,
            Some(Value::from("NEW, TEMPORARY"))
        );
    }
}
