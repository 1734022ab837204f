/// End-to-end tests over a small IFC4 model
use anyhow::Result;
use ifcwise::config::{ChunkPolicy, Config};
use ifcwise::error::{IfcWiseError, ModelError};
use ifcwise::export;
use ifcwise::extractor::{LOCATION_X, LOCATION_Y, LOCATION_Z, TableFilter};
use ifcwise::summary::ModelSummary;
use ifcwise::{ChunkStrategy, Pipeline, TableChunker};
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/small_model.ifc")
}

fn row_count_pipeline(max_rows: usize) -> Pipeline {
    let mut config = Config::default();
    config.chunking.max_rows_per_chunk = max_rows;
    Pipeline::new(config)
}

#[test]
fn test_table_shape() -> Result<()> {
    let output = Pipeline::default().run(fixture())?;
    let table = &output.table;

    assert_eq!(table.len(), 8);
    assert_eq!(table.columns().len(), 21);
    assert_eq!(
        table.element_types(),
        vec![
            "IfcSite",
            "IfcBuilding",
            "IfcBuildingStorey",
            "IfcWall",
            "IfcDoor",
            "IfcSlab"
        ]
    );
    assert_eq!(table.columns()[9], "Pset_WallCommon.IsExternal");
    assert_eq!(table.columns()[20], "Quantity.GrossArea");

    // rectangular
    for row in table.rows() {
        assert_eq!(row.len(), table.columns().len());
    }
    Ok(())
}

#[test]
fn test_cell_values() -> Result<()> {
    let table = Pipeline::default().run(fixture())?.table;
    let text = |row: usize, column: &str| table.cell(row, column).map(|c| c.render());

    // walls are rows 3..=5, the door is row 6, the slab row 7
    assert_eq!(text(4, LOCATION_X).as_deref(), Some("5000.0"));
    assert_eq!(text(3, "Pset_WallCommon.LoadBearing").as_deref(), Some("false"));
    assert_eq!(text(3, "Quantity.Length").as_deref(), Some("5000.0"));
    assert_eq!(text(3, "Quantity.NetVolume").as_deref(), Some("4.05"));
    assert_eq!(text(4, "Quantity.Length").as_deref(), Some(""));
    assert_eq!(table.column_index("Quantity.Width"), None);
    assert_eq!(text(3, "Qto_WallBaseQuantities.Width").as_deref(), Some("0.0"));

    assert_eq!(text(6, "PredefinedType").as_deref(), Some("DOOR"));
    assert_eq!(text(6, "Pset_DoorCommon.Reference").as_deref(), Some("D-TYPE-1"));
    assert_eq!(text(6, "Pset_DoorCommon.FireRating").as_deref(), Some("EI 60"));

    assert_eq!(text(7, "Pset_SlabCommon.AcousticRating").as_deref(), Some(""));
    assert_eq!(text(7, "Quantity.GrossArea").as_deref(), Some("42.5"));
    Ok(())
}

#[test]
fn test_unresolvable_placement_is_empty() -> Result<()> {
    let table = Pipeline::default().run(fixture())?.table;

    for column in [LOCATION_X, LOCATION_Y, LOCATION_Z] {
        let cell = table.cell(7, column).expect("location column");
        assert!(cell.is_absent());
        assert_eq!(cell.render(), "");
    }
    Ok(())
}

#[test]
fn test_chunks_preserve_order_and_rows() -> Result<()> {
    let output = row_count_pipeline(2).run(fixture())?;
    let table = &output.table;

    let labels: Vec<String> = output.chunks.iter().map(|c| c.label()).collect();
    assert_eq!(
        labels,
        vec![
            "IfcSite - Chunk 1 of 1",
            "IfcBuilding - Chunk 1 of 1",
            "IfcBuildingStorey - Chunk 1 of 1",
            "IfcWall - Chunk 1 of 2",
            "IfcWall - Chunk 2 of 2",
            "IfcDoor - Chunk 1 of 1",
            "IfcSlab - Chunk 1 of 1",
        ]
    );

    // completeness and order: rows are grouped contiguously in this model
    let indices: Vec<usize> = output
        .chunks
        .iter()
        .flat_map(|c| c.row_indices.iter().copied())
        .collect();
    assert_eq!(indices, (0..table.len()).collect::<Vec<_>>());

    // category isolation and copied rows
    for chunk in &output.chunks {
        for (&i, row) in chunk.row_indices.iter().zip(&chunk.rows) {
            assert_eq!(table.category_of(i), chunk.category);
            assert_eq!(table.rows()[i], *row);
        }
    }
    Ok(())
}

#[test]
fn test_payload_header_is_shared() -> Result<()> {
    let output = row_count_pipeline(2).run(fixture())?;
    let header = export::header_line(&output.table)?;

    for chunk in &output.chunks {
        assert!(chunk.payload.starts_with(&header));
    }
    // quoted name survives in the payload
    assert!(output.chunks[3].payload.contains("\"Wall, east\""));
    Ok(())
}

#[test]
fn test_pipeline_is_idempotent() -> Result<()> {
    let pipeline = row_count_pipeline(3);
    let first = pipeline.run(fixture())?;
    let second = pipeline.run(fixture())?;

    assert_eq!(first, second);
    let digests = |o: &ifcwise::PipelineOutput| -> Vec<String> {
        o.chunks.iter().map(|c| c.digest()).collect()
    };
    assert_eq!(digests(&first), digests(&second));
    Ok(())
}

#[test]
fn test_parallel_extraction_matches() -> Result<()> {
    let mut config = Config::default();
    config.extraction.parallel = true;

    let parallel = Pipeline::new(config).run(fixture())?;
    let sequential = Pipeline::default().run(fixture())?;
    assert_eq!(parallel, sequential);
    Ok(())
}

#[test]
fn test_size_estimate_policy() -> Result<()> {
    let mut config = Config::default();
    config.chunking.chunk_policy = ChunkPolicy::SizeEstimate;
    config.chunking.max_size_units_per_chunk = 1;

    let output = Pipeline::new(config).run(fixture())?;
    // header alone exceeds the budget: one oversized chunk per row
    assert_eq!(output.chunks.len(), output.table.len());
    assert!(output.chunks.iter().all(|c| c.oversized && c.row_count() == 1));
    Ok(())
}

#[test]
fn test_single_category() -> Result<()> {
    let mut config = Config::default();
    config.extraction.category = "IfcWall".to_string();

    let output = Pipeline::new(config).run(fixture())?;
    assert_eq!(output.table.len(), 3);
    assert_eq!(output.chunks.len(), 1);
    assert_eq!(output.chunks[0].label(), "IfcWall - Chunk 1 of 1");
    Ok(())
}

#[test]
fn test_element_category_skips_spatial_structure() -> Result<()> {
    let mut config = Config::default();
    config.extraction.category = "IfcElement".to_string();

    let output = Pipeline::new(config).run(fixture())?;
    assert_eq!(output.table.len(), 5);
    assert_eq!(output.table.element_types(), vec!["IfcWall", "IfcDoor", "IfcSlab"]);
    Ok(())
}

#[test]
fn test_filter_then_chunk_without_type_column() -> Result<()> {
    let pipeline = Pipeline::default();
    let model = pipeline.load_model(fixture())?;
    let filter = TableFilter {
        search: Some("basic wall".to_string()),
        columns: vec!["GlobalId".to_string(), "Name".to_string()],
        ..Default::default()
    };
    let table = filter.apply(&pipeline.extract(&model));
    assert_eq!(table.len(), 3);

    let chunks = TableChunker::new(ChunkStrategy::RowCount(10)).plan(&table)?;
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].label(), "Uncategorized - Chunk 1 of 1");
    Ok(())
}

#[test]
fn test_export_files() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let table = Pipeline::default().run(fixture())?.table;

    let csv_path = temp_dir.path().join("elements.csv");
    std::fs::write(&csv_path, export::to_csv(&table)?)?;
    let mut reader = csv::Reader::from_path(&csv_path)?;
    assert_eq!(reader.headers()?.len(), 21);
    assert_eq!(reader.records().count(), 8);

    let json: serde_json::Value = serde_json::from_str(&export::to_json(&table)?)?;
    assert_eq!(json.as_array().map(Vec::len), Some(8));
    assert_eq!(json[7]["Quantity.GrossArea"], serde_json::json!(42.5));
    Ok(())
}

#[test]
fn test_summary_of_fixture() -> Result<()> {
    let model = Pipeline::default().load_model(fixture())?;
    let summary = ModelSummary::from_file(&model, fixture())?;

    assert_eq!(summary.file_name, "small_model.ifc");
    assert_eq!(summary.schema, "IFC4");
    assert_eq!(summary.creation_date, "2024-03-01");
    assert_eq!((summary.sites, summary.buildings, summary.storeys), (1, 1, 1));
    assert_eq!(summary.total_elements, 8);
    assert_eq!(summary.element_counts[0].element_type, "IfcWall");
    assert_eq!(summary.element_counts[0].count, 3);
    assert_eq!(summary.content_digest, model.content_digest());
    Ok(())
}

#[test]
fn test_unreadable_source_is_fatal() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let missing = temp_dir.path().join("missing.ifc");
    assert!(matches!(
        Pipeline::default().run(&missing),
        Err(IfcWiseError::Model(ModelError::FileNotFound(_)))
    ));

    let broken = temp_dir.path().join("broken.ifc");
    std::fs::write(&broken, "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n#1=IFCWALL('x'\n")?;
    assert!(matches!(
        Pipeline::default().run(&broken),
        Err(IfcWiseError::Model(ModelError::Syntax { .. }))
    ));
    Ok(())
}
