//! Integration tests for the global logger
//!
//! Run with: cargo test --test logging_integration_tests

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use serial_test::serial;
use pvr_texture::pvr::Engine;
use pvr_texture::pvr::Error;
use pvr_texture::pvr::formats::{dds, load_texture, ContainerFormat};
use pvr_texture::pvr::log::{LogEntry, LogSeverity, Logger};

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    Engine::log(LogSeverity::Info, "test::module", "Test info message".to_string());
    Engine::log(LogSeverity::Warn, "test::module", "Test warning message".to_string());

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].severity, LogSeverity::Info);
        assert_eq!(captured[0].source, "test::module");
        assert_eq!(captured[1].message, "Test warning message");
        assert!(captured[1].file.is_none());
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_parse_error_is_logged_where_raised() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    let mut short = dds::DDS_MAGIC.to_vec();
    short.extend_from_slice(&[0u8; 60]);
    let result = load_texture(&mut Cursor::new(short), Some(ContainerFormat::Dds));
    assert!(matches!(result, Err(Error::CorruptData(_))));

    {
        let captured = entries.lock().unwrap();
        let error = captured
            .iter()
            .find(|e| e.severity == LogSeverity::Error)
            .expect("error entry");
        assert_eq!(error.source, "pvr::formats::dds");
        assert!(error.file.is_some());
        assert!(error.line.is_some());
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_min_severity_filters() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);
    Engine::set_min_severity(LogSeverity::Warn);

    Engine::log(LogSeverity::Debug, "test::module", "dropped".to_string());
    Engine::log(LogSeverity::Info, "test::module", "dropped".to_string());
    Engine::log(LogSeverity::Error, "test::module", "kept".to_string());

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].message, "kept");
    }

    Engine::set_min_severity(LogSeverity::Info);
    assert_eq!(Engine::min_severity(), LogSeverity::Info);
    Engine::reset_logger();
}
