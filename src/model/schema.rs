//! Entity type knowledge needed by the reader: the product branch of the
//! type hierarchy, canonical names, and where `PredefinedType` sits.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Schema generation, which decides attribute layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFamily {
    Ifc2x3,
    /// IFC4 and its addenda (IFC4X1..IFC4X3)
    Ifc4,
}

impl SchemaFamily {
    pub fn from_identifier(schema: &str) -> Self {
        if schema.to_ascii_uppercase().starts_with("IFC2X") {
            SchemaFamily::Ifc2x3
        } else {
            SchemaFamily::Ifc4
        }
    }
}

/// `(entity, supertype)` for every type under `IfcProduct`, IFC4 through IFC4X3
const SUPERTYPES: &[(&str, &str)] = &[
    ("IfcProduct", "IfcObject"),
    ("IfcAnnotation", "IfcProduct"),
    ("IfcElement", "IfcProduct"),
    ("IfcLinearElement", "IfcProduct"),
    ("IfcPort", "IfcProduct"),
    ("IfcPositioningElement", "IfcProduct"),
    ("IfcProxy", "IfcProduct"),
    ("IfcSpatialElement", "IfcProduct"),
    ("IfcStructuralActivity", "IfcProduct"),
    ("IfcStructuralItem", "IfcProduct"),
    // positioning
    ("IfcAlignment", "IfcPositioningElement"),
    ("IfcGrid", "IfcPositioningElement"),
    ("IfcLinearPositioningElement", "IfcPositioningElement"),
    ("IfcReferent", "IfcPositioningElement"),
    ("IfcAlignmentCant", "IfcLinearElement"),
    ("IfcAlignmentHorizontal", "IfcLinearElement"),
    ("IfcAlignmentSegment", "IfcLinearElement"),
    ("IfcAlignmentVertical", "IfcLinearElement"),
    ("IfcDistributionPort", "IfcPort"),
    // spatial
    ("IfcExternalSpatialStructureElement", "IfcSpatialElement"),
    ("IfcExternalSpatialElement", "IfcExternalSpatialStructureElement"),
    ("IfcSpatialStructureElement", "IfcSpatialElement"),
    ("IfcSpatialZone", "IfcSpatialElement"),
    ("IfcBuildingStorey", "IfcSpatialStructureElement"),
    ("IfcFacility", "IfcSpatialStructureElement"),
    ("IfcFacilityPart", "IfcSpatialStructureElement"),
    ("IfcSite", "IfcSpatialStructureElement"),
    ("IfcSpace", "IfcSpatialStructureElement"),
    ("IfcBridge", "IfcFacility"),
    ("IfcBuilding", "IfcFacility"),
    ("IfcMarineFacility", "IfcFacility"),
    ("IfcRailway", "IfcFacility"),
    ("IfcRoad", "IfcFacility"),
    ("IfcBridgePart", "IfcFacilityPart"),
    ("IfcFacilityPartCommon", "IfcFacilityPart"),
    ("IfcMarinePart", "IfcFacilityPart"),
    ("IfcRailwayPart", "IfcFacilityPart"),
    ("IfcRoadPart", "IfcFacilityPart"),
    // element branches
    ("IfcBuiltElement", "IfcElement"),
    ("IfcCivilElement", "IfcElement"),
    ("IfcDistributionElement", "IfcElement"),
    ("IfcElementAssembly", "IfcElement"),
    ("IfcElementComponent", "IfcElement"),
    ("IfcFeatureElement", "IfcElement"),
    ("IfcFurnishingElement", "IfcElement"),
    ("IfcGeographicElement", "IfcElement"),
    ("IfcGeotechnicalElement", "IfcElement"),
    ("IfcTransportationDevice", "IfcElement"),
    ("IfcVirtualElement", "IfcElement"),
    // IFC4X3 renamed IfcBuildingElement to IfcBuiltElement
    ("IfcBuildingElement", "IfcBuiltElement"),
    ("IfcBeam", "IfcBuildingElement"),
    ("IfcBeamStandardCase", "IfcBeam"),
    ("IfcBuildingElementProxy", "IfcBuildingElement"),
    ("IfcChimney", "IfcBuildingElement"),
    ("IfcColumn", "IfcBuildingElement"),
    ("IfcColumnStandardCase", "IfcColumn"),
    ("IfcCovering", "IfcBuildingElement"),
    ("IfcCurtainWall", "IfcBuildingElement"),
    ("IfcDoor", "IfcBuildingElement"),
    ("IfcDoorStandardCase", "IfcDoor"),
    ("IfcFooting", "IfcBuildingElement"),
    ("IfcMember", "IfcBuildingElement"),
    ("IfcMemberStandardCase", "IfcMember"),
    ("IfcPile", "IfcBuildingElement"),
    ("IfcPlate", "IfcBuildingElement"),
    ("IfcPlateStandardCase", "IfcPlate"),
    ("IfcRailing", "IfcBuildingElement"),
    ("IfcRamp", "IfcBuildingElement"),
    ("IfcRampFlight", "IfcBuildingElement"),
    ("IfcRoof", "IfcBuildingElement"),
    ("IfcShadingDevice", "IfcBuildingElement"),
    ("IfcSlab", "IfcBuildingElement"),
    ("IfcSlabElementedCase", "IfcSlab"),
    ("IfcSlabStandardCase", "IfcSlab"),
    ("IfcStair", "IfcBuildingElement"),
    ("IfcStairFlight", "IfcBuildingElement"),
    ("IfcWall", "IfcBuildingElement"),
    ("IfcWallElementedCase", "IfcWall"),
    ("IfcWallStandardCase", "IfcWall"),
    ("IfcWindow", "IfcBuildingElement"),
    ("IfcWindowStandardCase", "IfcWindow"),
    ("IfcBearing", "IfcBuiltElement"),
    ("IfcCourse", "IfcBuiltElement"),
    ("IfcDeepFoundation", "IfcBuiltElement"),
    ("IfcCaissonFoundation", "IfcDeepFoundation"),
    ("IfcEarthworksElement", "IfcBuiltElement"),
    ("IfcEarthworksFill", "IfcEarthworksElement"),
    ("IfcReinforcedSoil", "IfcEarthworksElement"),
    ("IfcKerb", "IfcBuiltElement"),
    ("IfcMooringDevice", "IfcBuiltElement"),
    ("IfcNavigationElement", "IfcBuiltElement"),
    ("IfcPavement", "IfcBuiltElement"),
    ("IfcRail", "IfcBuiltElement"),
    ("IfcTrackElement", "IfcBuiltElement"),
    // components
    ("IfcBuildingElementPart", "IfcElementComponent"),
    ("IfcDiscreteAccessory", "IfcElementComponent"),
    ("IfcFastener", "IfcElementComponent"),
    ("IfcImpactProtectionDevice", "IfcElementComponent"),
    ("IfcMechanicalFastener", "IfcElementComponent"),
    ("IfcReinforcingElement", "IfcElementComponent"),
    ("IfcSign", "IfcElementComponent"),
    ("IfcVibrationDamper", "IfcElementComponent"),
    ("IfcVibrationIsolator", "IfcElementComponent"),
    ("IfcReinforcingBar", "IfcReinforcingElement"),
    ("IfcReinforcingMesh", "IfcReinforcingElement"),
    ("IfcTendon", "IfcReinforcingElement"),
    ("IfcTendonAnchor", "IfcReinforcingElement"),
    ("IfcTendonConduit", "IfcReinforcingElement"),
    // features
    ("IfcFeatureElementAddition", "IfcFeatureElement"),
    ("IfcFeatureElementSubtraction", "IfcFeatureElement"),
    ("IfcSurfaceFeature", "IfcFeatureElement"),
    ("IfcProjectionElement", "IfcFeatureElementAddition"),
    ("IfcEarthworksCut", "IfcFeatureElementSubtraction"),
    ("IfcOpeningElement", "IfcFeatureElementSubtraction"),
    ("IfcOpeningStandardCase", "IfcOpeningElement"),
    ("IfcVoidingFeature", "IfcFeatureElementSubtraction"),
    // furnishing, geotechnics, transport
    ("IfcFurniture", "IfcFurnishingElement"),
    ("IfcSystemFurnitureElement", "IfcFurnishingElement"),
    ("IfcGeotechnicalAssembly", "IfcGeotechnicalElement"),
    ("IfcGeotechnicalStratum", "IfcGeotechnicalElement"),
    ("IfcBorehole", "IfcGeotechnicalAssembly"),
    ("IfcGeomodel", "IfcGeotechnicalAssembly"),
    ("IfcGeoslice", "IfcGeotechnicalAssembly"),
    ("IfcTransportElement", "IfcTransportationDevice"),
    ("IfcVehicle", "IfcTransportationDevice"),
    // distribution
    ("IfcDistributionControlElement", "IfcDistributionElement"),
    ("IfcDistributionFlowElement", "IfcDistributionElement"),
    ("IfcActuator", "IfcDistributionControlElement"),
    ("IfcAlarm", "IfcDistributionControlElement"),
    ("IfcController", "IfcDistributionControlElement"),
    ("IfcFlowInstrument", "IfcDistributionControlElement"),
    ("IfcProtectiveDeviceTrippingUnit", "IfcDistributionControlElement"),
    ("IfcSensor", "IfcDistributionControlElement"),
    ("IfcUnitaryControlElement", "IfcDistributionControlElement"),
    ("IfcDistributionChamberElement", "IfcDistributionFlowElement"),
    ("IfcEnergyConversionDevice", "IfcDistributionFlowElement"),
    ("IfcFlowController", "IfcDistributionFlowElement"),
    ("IfcFlowFitting", "IfcDistributionFlowElement"),
    ("IfcFlowMovingDevice", "IfcDistributionFlowElement"),
    ("IfcFlowSegment", "IfcDistributionFlowElement"),
    ("IfcFlowStorageDevice", "IfcDistributionFlowElement"),
    ("IfcFlowTerminal", "IfcDistributionFlowElement"),
    ("IfcFlowTreatmentDevice", "IfcDistributionFlowElement"),
    ("IfcAirToAirHeatRecovery", "IfcEnergyConversionDevice"),
    ("IfcBoiler", "IfcEnergyConversionDevice"),
    ("IfcBurner", "IfcEnergyConversionDevice"),
    ("IfcChiller", "IfcEnergyConversionDevice"),
    ("IfcCoil", "IfcEnergyConversionDevice"),
    ("IfcCondenser", "IfcEnergyConversionDevice"),
    ("IfcCooledBeam", "IfcEnergyConversionDevice"),
    ("IfcCoolingTower", "IfcEnergyConversionDevice"),
    ("IfcElectricGenerator", "IfcEnergyConversionDevice"),
    ("IfcElectricMotor", "IfcEnergyConversionDevice"),
    ("IfcEngine", "IfcEnergyConversionDevice"),
    ("IfcEvaporativeCooler", "IfcEnergyConversionDevice"),
    ("IfcEvaporator", "IfcEnergyConversionDevice"),
    ("IfcHeatExchanger", "IfcEnergyConversionDevice"),
    ("IfcHumidifier", "IfcEnergyConversionDevice"),
    ("IfcMotorConnection", "IfcEnergyConversionDevice"),
    ("IfcSolarDevice", "IfcEnergyConversionDevice"),
    ("IfcTransformer", "IfcEnergyConversionDevice"),
    ("IfcTubeBundle", "IfcEnergyConversionDevice"),
    ("IfcUnitaryEquipment", "IfcEnergyConversionDevice"),
    ("IfcAirTerminalBox", "IfcFlowController"),
    ("IfcDamper", "IfcFlowController"),
    ("IfcElectricDistributionBoard", "IfcFlowController"),
    ("IfcElectricTimeControl", "IfcFlowController"),
    ("IfcFlowMeter", "IfcFlowController"),
    ("IfcProtectiveDevice", "IfcFlowController"),
    ("IfcSwitchingDevice", "IfcFlowController"),
    ("IfcValve", "IfcFlowController"),
    ("IfcCableCarrierFitting", "IfcFlowFitting"),
    ("IfcCableFitting", "IfcFlowFitting"),
    ("IfcDuctFitting", "IfcFlowFitting"),
    ("IfcJunctionBox", "IfcFlowFitting"),
    ("IfcPipeFitting", "IfcFlowFitting"),
    ("IfcCompressor", "IfcFlowMovingDevice"),
    ("IfcFan", "IfcFlowMovingDevice"),
    ("IfcPump", "IfcFlowMovingDevice"),
    ("IfcCableCarrierSegment", "IfcFlowSegment"),
    ("IfcCableSegment", "IfcFlowSegment"),
    ("IfcConveyorSegment", "IfcFlowSegment"),
    ("IfcDuctSegment", "IfcFlowSegment"),
    ("IfcPipeSegment", "IfcFlowSegment"),
    ("IfcElectricFlowStorageDevice", "IfcFlowStorageDevice"),
    ("IfcTank", "IfcFlowStorageDevice"),
    ("IfcAirTerminal", "IfcFlowTerminal"),
    ("IfcAudioVisualAppliance", "IfcFlowTerminal"),
    ("IfcCommunicationsAppliance", "IfcFlowTerminal"),
    ("IfcElectricAppliance", "IfcFlowTerminal"),
    ("IfcFireSuppressionTerminal", "IfcFlowTerminal"),
    ("IfcLamp", "IfcFlowTerminal"),
    ("IfcLightFixture", "IfcFlowTerminal"),
    ("IfcLiquidTerminal", "IfcFlowTerminal"),
    ("IfcMedicalDevice", "IfcFlowTerminal"),
    ("IfcMobileTelecommunicationsAppliance", "IfcFlowTerminal"),
    ("IfcOutlet", "IfcFlowTerminal"),
    ("IfcSanitaryTerminal", "IfcFlowTerminal"),
    ("IfcSignal", "IfcFlowTerminal"),
    ("IfcSpaceHeater", "IfcFlowTerminal"),
    ("IfcStackTerminal", "IfcFlowTerminal"),
    ("IfcWasteTerminal", "IfcFlowTerminal"),
    ("IfcDuctSilencer", "IfcFlowTreatmentDevice"),
    ("IfcFilter", "IfcFlowTreatmentDevice"),
    ("IfcInterceptor", "IfcFlowTreatmentDevice"),
    // structural analysis
    ("IfcStructuralConnection", "IfcStructuralItem"),
    ("IfcStructuralMember", "IfcStructuralItem"),
    ("IfcStructuralCurveConnection", "IfcStructuralConnection"),
    ("IfcStructuralPointConnection", "IfcStructuralConnection"),
    ("IfcStructuralSurfaceConnection", "IfcStructuralConnection"),
    ("IfcStructuralCurveMember", "IfcStructuralMember"),
    ("IfcStructuralCurveMemberVarying", "IfcStructuralCurveMember"),
    ("IfcStructuralSurfaceMember", "IfcStructuralMember"),
    ("IfcStructuralSurfaceMemberVarying", "IfcStructuralSurfaceMember"),
    ("IfcStructuralAction", "IfcStructuralActivity"),
    ("IfcStructuralReaction", "IfcStructuralActivity"),
    ("IfcStructuralCurveAction", "IfcStructuralAction"),
    ("IfcStructuralLinearAction", "IfcStructuralCurveAction"),
    ("IfcStructuralPointAction", "IfcStructuralAction"),
    ("IfcStructuralSurfaceAction", "IfcStructuralAction"),
    ("IfcStructuralPlanarAction", "IfcStructuralSurfaceAction"),
    ("IfcStructuralCurveReaction", "IfcStructuralReaction"),
    ("IfcStructuralPointReaction", "IfcStructuralReaction"),
    ("IfcStructuralSurfaceReaction", "IfcStructuralReaction"),
];

/// IFC2X3 entities and placements that differ from [`SUPERTYPES`]
const SUPERTYPES_IFC2X3: &[(&str, &str)] = &[
    ("IfcGrid", "IfcProduct"),
    ("IfcSpatialStructureElement", "IfcProduct"),
    ("IfcBuilding", "IfcSpatialStructureElement"),
    ("IfcBuildingElement", "IfcElement"),
    ("IfcBuildingElementComponent", "IfcBuildingElement"),
    ("IfcBuildingElementPart", "IfcBuildingElementComponent"),
    ("IfcReinforcingElement", "IfcBuildingElementComponent"),
    ("IfcElectricalElement", "IfcElement"),
    ("IfcEquipmentElement", "IfcElement"),
    ("IfcTransportElement", "IfcElement"),
    ("IfcElectricDistributionPoint", "IfcFlowController"),
    ("IfcEdgeFeature", "IfcFeatureElementSubtraction"),
    ("IfcChamferEdgeFeature", "IfcEdgeFeature"),
    ("IfcRoundedEdgeFeature", "IfcEdgeFeature"),
    ("IfcStructuralLinearAction", "IfcStructuralAction"),
    ("IfcStructuralLinearActionVarying", "IfcStructuralLinearAction"),
    ("IfcStructuralPlanarAction", "IfcStructuralAction"),
    ("IfcStructuralPlanarActionVarying", "IfcStructuralPlanarAction"),
];

struct Node {
    name: &'static str,
    parent: Option<String>,
}

/// Supertype links for one schema family, keyed by upper-case entity name
pub struct TypeHierarchy {
    nodes: HashMap<String, Node>,
}

impl TypeHierarchy {
    fn from_tables(tables: &[&[(&'static str, &'static str)]]) -> Self {
        let mut nodes = HashMap::new();
        for table in tables {
            for &(name, parent) in table.iter() {
                nodes.insert(
                    name.to_ascii_uppercase(),
                    Node {
                        name,
                        parent: Some(parent.to_ascii_uppercase()),
                    },
                );
            }
        }
        let roots: Vec<&'static str> = tables
            .iter()
            .flat_map(|t| t.iter().map(|(_, parent)| *parent))
            .collect();
        for root in roots {
            nodes
                .entry(root.to_ascii_uppercase())
                .or_insert(Node { name: root, parent: None });
        }
        Self { nodes }
    }

    /// `IFCWALL` → `IfcWall`
    pub fn canonical(&self, type_name: &str) -> Option<&'static str> {
        self.nodes
            .get(&type_name.to_ascii_uppercase())
            .map(|node| node.name)
    }

    pub fn supertype(&self, type_name: &str) -> Option<&'static str> {
        let parent = self.nodes.get(&type_name.to_ascii_uppercase())?.parent.as_deref()?;
        self.nodes.get(parent).map(|node| node.name)
    }

    /// True when `type_name` is `ancestor` or one of its subtypes
    pub fn is_subtype_of(&self, type_name: &str, ancestor: &str) -> bool {
        if type_name.eq_ignore_ascii_case(ancestor) {
            return true;
        }
        let mut current = self.nodes.get(&type_name.to_ascii_uppercase());
        while let Some(node) = current {
            if node.name.eq_ignore_ascii_case(ancestor) {
                return true;
            }
            current = node.parent.as_deref().and_then(|p| self.nodes.get(p));
        }
        false
    }

    pub fn is_product(&self, type_name: &str) -> bool {
        self.is_subtype_of(type_name, "IfcProduct")
    }
}

static IFC4_HIERARCHY: LazyLock<TypeHierarchy> =
    LazyLock::new(|| TypeHierarchy::from_tables(&[SUPERTYPES]));

static IFC2X3_HIERARCHY: LazyLock<TypeHierarchy> =
    LazyLock::new(|| TypeHierarchy::from_tables(&[SUPERTYPES, SUPERTYPES_IFC2X3]));

pub fn hierarchy(family: SchemaFamily) -> &'static TypeHierarchy {
    match family {
        SchemaFamily::Ifc2x3 => &IFC2X3_HIERARCHY,
        SchemaFamily::Ifc4 => &IFC4_HIERARCHY,
    }
}

pub fn is_product_type(type_name: &str, family: SchemaFamily) -> bool {
    hierarchy(family).is_product(type_name)
}

/// `IFCWALL` → `IfcWall`; unknown names are returned as written
pub fn canonical_type_name(type_name: &str) -> String {
    hierarchy(SchemaFamily::Ifc2x3)
        .canonical(type_name)
        .map(str::to_string)
        .unwrap_or_else(|| type_name.to_string())
}

const PREDEFINED_IFC4: &[(&str, usize)] = &[
    ("IfcActuator", 8),
    ("IfcAirTerminal", 8),
    ("IfcAirTerminalBox", 8),
    ("IfcAirToAirHeatRecovery", 8),
    ("IfcAlarm", 8),
    ("IfcAudioVisualAppliance", 8),
    ("IfcBeam", 8),
    ("IfcBeamStandardCase", 8),
    ("IfcBoiler", 8),
    ("IfcBuildingElementPart", 8),
    ("IfcBuildingElementProxy", 8),
    ("IfcBurner", 8),
    ("IfcCableCarrierFitting", 8),
    ("IfcCableCarrierSegment", 8),
    ("IfcCableFitting", 8),
    ("IfcCableSegment", 8),
    ("IfcChiller", 8),
    ("IfcChimney", 8),
    ("IfcCoil", 8),
    ("IfcColumn", 8),
    ("IfcColumnStandardCase", 8),
    ("IfcCommunicationsAppliance", 8),
    ("IfcCompressor", 8),
    ("IfcCondenser", 8),
    ("IfcController", 8),
    ("IfcCooledBeam", 8),
    ("IfcCoolingTower", 8),
    ("IfcCovering", 8),
    ("IfcCurtainWall", 8),
    ("IfcDamper", 8),
    ("IfcDiscreteAccessory", 8),
    ("IfcDistributionChamberElement", 8),
    ("IfcDistributionPort", 8),
    ("IfcDoor", 10),
    ("IfcDoorStandardCase", 10),
    ("IfcDuctFitting", 8),
    ("IfcDuctSegment", 8),
    ("IfcDuctSilencer", 8),
    ("IfcElectricAppliance", 8),
    ("IfcElectricDistributionBoard", 8),
    ("IfcElectricFlowStorageDevice", 8),
    ("IfcElectricGenerator", 8),
    ("IfcElectricMotor", 8),
    ("IfcElectricTimeControl", 8),
    ("IfcElementAssembly", 9),
    ("IfcEngine", 8),
    ("IfcEvaporativeCooler", 8),
    ("IfcEvaporator", 8),
    ("IfcExternalSpatialElement", 8),
    ("IfcFan", 8),
    ("IfcFastener", 8),
    ("IfcFilter", 8),
    ("IfcFireSuppressionTerminal", 8),
    ("IfcFlowInstrument", 8),
    ("IfcFlowMeter", 8),
    ("IfcFooting", 8),
    ("IfcFurniture", 8),
    ("IfcGeographicElement", 8),
    ("IfcGrid", 10),
    ("IfcHeatExchanger", 8),
    ("IfcHumidifier", 8),
    ("IfcInterceptor", 8),
    ("IfcJunctionBox", 8),
    ("IfcLamp", 8),
    ("IfcLightFixture", 8),
    ("IfcMechanicalFastener", 10),
    ("IfcMedicalDevice", 8),
    ("IfcMember", 8),
    ("IfcMemberStandardCase", 8),
    ("IfcMotorConnection", 8),
    ("IfcOpeningElement", 8),
    ("IfcOpeningStandardCase", 8),
    ("IfcOutlet", 8),
    ("IfcPile", 8),
    ("IfcPipeFitting", 8),
    ("IfcPipeSegment", 8),
    ("IfcPlate", 8),
    ("IfcPlateStandardCase", 8),
    ("IfcProjectionElement", 8),
    ("IfcProtectiveDevice", 8),
    ("IfcProtectiveDeviceTrippingUnit", 8),
    ("IfcPump", 8),
    ("IfcRailing", 8),
    ("IfcRamp", 8),
    ("IfcRampFlight", 8),
    ("IfcReinforcingBar", 12),
    ("IfcReinforcingMesh", 17),
    ("IfcRoof", 8),
    ("IfcSanitaryTerminal", 8),
    ("IfcSensor", 8),
    ("IfcShadingDevice", 8),
    ("IfcSlab", 8),
    ("IfcSlabElementedCase", 8),
    ("IfcSlabStandardCase", 8),
    ("IfcSolarDevice", 8),
    ("IfcSpace", 9),
    ("IfcSpaceHeater", 8),
    ("IfcSpatialZone", 8),
    ("IfcStackTerminal", 8),
    ("IfcStair", 8),
    ("IfcStairFlight", 12),
    ("IfcStructuralCurveAction", 11),
    ("IfcStructuralCurveMember", 7),
    ("IfcStructuralCurveMemberVarying", 7),
    ("IfcStructuralCurveReaction", 9),
    ("IfcStructuralLinearAction", 11),
    ("IfcStructuralPlanarAction", 11),
    ("IfcStructuralSurfaceAction", 11),
    ("IfcStructuralSurfaceMember", 7),
    ("IfcStructuralSurfaceMemberVarying", 7),
    ("IfcSurfaceFeature", 8),
    ("IfcSwitchingDevice", 8),
    ("IfcSystemFurnitureElement", 8),
    ("IfcTank", 8),
    ("IfcTendon", 9),
    ("IfcTendonAnchor", 9),
    ("IfcTransformer", 8),
    ("IfcTransportElement", 8),
    ("IfcTubeBundle", 8),
    ("IfcUnitaryControlElement", 8),
    ("IfcUnitaryEquipment", 8),
    ("IfcValve", 8),
    ("IfcVibrationIsolator", 8),
    ("IfcVoidingFeature", 8),
    ("IfcWall", 8),
    ("IfcWallElementedCase", 8),
    ("IfcWallStandardCase", 8),
    ("IfcWasteTerminal", 8),
    ("IfcWindow", 10),
    ("IfcWindowStandardCase", 10),
];

const PREDEFINED_IFC2X3: &[(&str, usize)] = &[
    ("IfcCovering", 8),
    ("IfcElementAssembly", 9),
    ("IfcFooting", 8),
    ("IfcPile", 8),
    ("IfcRailing", 8),
    ("IfcSlab", 8),
    ("IfcStructuralCurveMember", 7),
    ("IfcStructuralSurfaceMember", 7),
    ("IfcTendon", 9),
];

/// Attribute index of `PredefinedType`, `None` when the type has none
pub fn predefined_type_index(type_name: &str, family: SchemaFamily) -> Option<usize> {
    let table = match family {
        SchemaFamily::Ifc2x3 => PREDEFINED_IFC2X3,
        SchemaFamily::Ifc4 => PREDEFINED_IFC4,
    };
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(type_name))
        .map(|(_, index)| *index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_family() {
        assert_eq!(SchemaFamily::from_identifier("IFC2X3"), SchemaFamily::Ifc2x3);
        assert_eq!(SchemaFamily::from_identifier("ifc2x3_tc1"), SchemaFamily::Ifc2x3);
        assert_eq!(SchemaFamily::from_identifier("IFC4"), SchemaFamily::Ifc4);
        assert_eq!(SchemaFamily::from_identifier("IFC4X3_ADD2"), SchemaFamily::Ifc4);
        assert_eq!(SchemaFamily::from_identifier(""), SchemaFamily::Ifc4);
    }

    #[test]
    fn test_canonical_type_name() {
        assert_eq!(canonical_type_name("IFCWALL"), "IfcWall");
        assert_eq!(canonical_type_name("IFCBUILDINGSTOREY"), "IfcBuildingStorey");
        assert_eq!(canonical_type_name("IFCPROPERTYSET"), "IFCPROPERTYSET");
    }

    #[test]
    fn test_products_exclude_definitions() {
        assert!(is_product_type("IFCDOOR", SchemaFamily::Ifc4));
        assert!(!is_product_type("IFCRELDEFINESBYPROPERTIES", SchemaFamily::Ifc4));
        assert!(!is_product_type("IFCPROJECT", SchemaFamily::Ifc4));
        assert!(!is_product_type("IFCOBJECT", SchemaFamily::Ifc4));
    }

    #[test]
    fn test_mep_and_structural_subtypes_are_products() {
        for name in [
            "IFCJUNCTIONBOX",
            "IFCPROTECTIVEDEVICE",
            "IFCFLOWMETER",
            "IFCFLOWINSTRUMENT",
            "IFCCOIL",
            "IFCELECTRICDISTRIBUTIONBOARD",
            "IFCCOMMUNICATIONSAPPLIANCE",
            "IFCTENDONANCHOR",
            "IFCSTRUCTURALSURFACECONNECTION",
            "IFCSTRUCTURALPOINTACTION",
            "IFCSTRUCTURALCURVEREACTION",
        ] {
            assert!(is_product_type(name, SchemaFamily::Ifc4), "{}", name);
        }
        assert!(is_product_type("IFCELECTRICDISTRIBUTIONPOINT", SchemaFamily::Ifc2x3));
        assert!(!is_product_type("IFCELECTRICDISTRIBUTIONPOINT", SchemaFamily::Ifc4));
    }

    #[test]
    fn test_subtype_walk() {
        let types = hierarchy(SchemaFamily::Ifc4);
        assert!(types.is_subtype_of("IFCWALLSTANDARDCASE", "IfcWall"));
        assert!(types.is_subtype_of("IFCWALL", "IfcBuildingElement"));
        assert!(types.is_subtype_of("IFCJUNCTIONBOX", "IfcElement"));
        assert!(types.is_subtype_of("IFCJUNCTIONBOX", "IfcDistributionFlowElement"));
        assert!(!types.is_subtype_of("IFCWALL", "IfcWallStandardCase"));
        assert!(!types.is_subtype_of("IFCSITE", "IfcElement"));
        // names outside the product branch only match themselves
        assert!(types.is_subtype_of("IFCPROPERTYSET", "IfcPropertySet"));
        assert_eq!(types.supertype("IFCWALLSTANDARDCASE"), Some("IfcWall"));
    }

    #[test]
    fn test_ifc2x3_placements_differ() {
        let legacy = hierarchy(SchemaFamily::Ifc2x3);
        assert_eq!(legacy.supertype("IFCBUILDINGELEMENTPART"), Some("IfcBuildingElementComponent"));
        assert!(legacy.is_subtype_of("IFCBUILDINGELEMENTPART", "IfcBuildingElement"));
        assert!(!hierarchy(SchemaFamily::Ifc4).is_subtype_of("IFCBUILDINGELEMENTPART", "IfcBuildingElement"));
    }

    #[test]
    fn test_predefined_type_depends_on_schema() {
        assert_eq!(predefined_type_index("IFCWALL", SchemaFamily::Ifc4), Some(8));
        assert_eq!(predefined_type_index("IFCWALL", SchemaFamily::Ifc2x3), None);
        assert_eq!(predefined_type_index("IFCDOOR", SchemaFamily::Ifc4), Some(10));
        assert_eq!(predefined_type_index("IFCSLAB", SchemaFamily::Ifc2x3), Some(8));
        assert_eq!(predefined_type_index("IFCSITE", SchemaFamily::Ifc4), None);
    }

    #[test]
    fn test_structural_and_assembly_predefined_types() {
        for family in [SchemaFamily::Ifc4, SchemaFamily::Ifc2x3] {
            assert_eq!(predefined_type_index("IFCSTRUCTURALCURVEMEMBER", family), Some(7));
            assert_eq!(predefined_type_index("IFCSTRUCTURALSURFACEMEMBER", family), Some(7));
            assert_eq!(predefined_type_index("IFCELEMENTASSEMBLY", family), Some(9));
            assert_eq!(predefined_type_index("IFCTENDON", family), Some(9));
        }
        assert_eq!(predefined_type_index("IFCJUNCTIONBOX", SchemaFamily::Ifc4), Some(8));
    }
}
