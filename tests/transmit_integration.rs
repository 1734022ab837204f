/// Transmission tests: directory output, failure reporting and resume
use anyhow::Result;
use ifcwise::config::Config;
use ifcwise::error::IfcWiseError;
use ifcwise::transmit::{BatchTransmitter, OutgoingBatch};
use ifcwise::{DirectoryTransmitter, Pipeline};
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/small_model.ifc")
}

fn pipeline() -> Pipeline {
    let mut config = Config::default();
    config.chunking.max_rows_per_chunk = 2;
    config.transmission.send_delay_ms = 0;
    Pipeline::new(config)
}

/// Fails every send of one sequence number until `heal` is called
struct Flaky {
    fail_on: Mutex<Option<usize>>,
    delivered: Mutex<Vec<OutgoingBatch>>,
}

impl Flaky {
    fn failing_on(sequence: usize) -> Self {
        Self {
            fail_on: Mutex::new(Some(sequence)),
            delivered: Mutex::new(Vec::new()),
        }
    }

    fn heal(&self) {
        *self.fail_on.lock().unwrap() = None;
    }
}

#[async_trait::async_trait]
impl BatchTransmitter for Flaky {
    async fn send(&self, _destination: &str, batch: &OutgoingBatch) -> Result<()> {
        if *self.fail_on.lock().unwrap() == Some(batch.sequence) {
            anyhow::bail!("backend unavailable");
        }
        self.delivered.lock().unwrap().push(batch.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_directory_transmitter_writes_messages() -> Result<()> {
    let out_dir = TempDir::new()?;
    let pipeline = pipeline();
    let output = pipeline.run(fixture())?;
    let transmitter = DirectoryTransmitter::new(out_dir.path());

    let report = pipeline
        .transmit(&transmitter, "Site Review", &output.chunks, 0)
        .await?;
    assert_eq!(report.sent, output.chunks.len());

    let dir = out_dir.path().join("site-review");
    let mut files: Vec<String> = std::fs::read_dir(&dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().to_string()))
        .collect::<std::io::Result<_>>()?;
    files.sort();
    assert_eq!(files.len(), 7);
    assert_eq!(files[0], "0001_ifcsite-chunk-1-of-1.txt");
    assert_eq!(files[4], "0005_ifcwall-chunk-2-of-2.txt");

    let message = std::fs::read_to_string(dir.join(&files[3]))?;
    assert!(message.starts_with("IFC Model Chunk 4: IfcWall - Chunk 1 of 2\n\nElementType,GlobalId,"));
    Ok(())
}

#[tokio::test]
async fn test_failure_then_resume_delivers_everything_once() -> Result<()> {
    let pipeline = pipeline();
    let output = pipeline.run(fixture())?;
    let transmitter = Flaky::failing_on(5);

    let err = pipeline
        .transmit(&transmitter, "session", &output.chunks, 0)
        .await
        .unwrap_err();
    let failed = match err {
        IfcWiseError::Transmission(failed) => failed,
        other => panic!("expected transmission error, got {other:?}"),
    };
    assert_eq!(failed.index, 4);
    assert_eq!(failed.label, "IfcWall - Chunk 2 of 2");
    assert!(failed.reason.contains("backend unavailable"));

    // re-plan from the unchanged source and continue where it stopped
    transmitter.heal();
    let replanned = pipeline.run(fixture())?;
    let report = pipeline
        .transmit(&transmitter, "session", &replanned.chunks, failed.index)
        .await?;
    assert_eq!(report.first_index, 4);
    assert_eq!(report.sent, 3);

    let delivered = transmitter.delivered.lock().unwrap();
    let sequences: Vec<usize> = delivered.iter().map(|b| b.sequence).collect();
    assert_eq!(sequences, (1..=7).collect::<Vec<_>>());
    let digests: Vec<&str> = delivered.iter().map(|b| b.digest.as_str()).collect();
    let expected: Vec<String> = output.chunks.iter().map(|c| c.digest()).collect();
    assert_eq!(digests, expected);
    Ok(())
}
