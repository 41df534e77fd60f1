use kvo_logger::{LevelFilter, Logger};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn json_file_logging_writes_json_lines() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder()
        .name("kvo-file")
        .console(false)
        .json()
        .path(&log_dir)
        .max_files(2)
        .level(LevelFilter::INFO)
        .init()?;

    tracing::info!(key = "name", "change dispatched");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    let line = contents.lines().find(|l| l.contains("change dispatched")).expect("event line");
    assert!(line.starts_with('{'), "expected a JSON line, got {line}");
    assert!(line.contains("\"key\":\"name\""));

    Ok(())
}
