//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, From<io::Error>).

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_format_error_display() {
    let err = Error::Format("Not a PVR file".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Format error"));
    assert!(display.contains("Not a PVR file"));
}

#[test]
fn test_corrupt_data_display() {
    let err = Error::CorruptData("width is zero".to_string());
    assert_eq!(format!("{}", err), "Corrupt data: width is zero");
}

#[test]
fn test_unsupported_variant_display() {
    let err = Error::UnsupportedVariant("EAC R11".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Unsupported variant"));
    assert!(display.contains("EAC R11"));
}

#[test]
fn test_backend_errors_display() {
    assert!(format!("{}", Error::AllocationFailure("oom".to_string())).starts_with("Allocation failure"));
    assert!(format!("{}", Error::UploadFailure("rejected".to_string())).starts_with("Upload failure"));
    assert!(format!("{}", Error::DecodeFailure("short".to_string())).starts_with("Decode failure"));
    assert!(format!("{}", Error::IndexOutOfRange("mip 3".to_string())).starts_with("Index out of range"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::Format("x".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug_and_clone() {
    let err = Error::CorruptData("bad".to_string());
    let cloned = err.clone();
    assert_eq!(err, cloned);
    assert!(format!("{:?}", cloned).contains("CorruptData"));
}

// ============================================================================
// IO CONVERSION
// ============================================================================

#[test]
fn test_unexpected_eof_maps_to_corrupt_data() {
    let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
    let err: Error = io.into();
    assert!(matches!(err, Error::CorruptData(_)));
}

#[test]
fn test_other_io_error_maps_to_io() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: Error = io.into();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_result_question_mark() {
    fn read_two() -> Result<u8> {
        let mut cursor = std::io::Cursor::new(vec![1u8]);
        let mut buf = [0u8; 2];
        std::io::Read::read_exact(&mut cursor, &mut buf)?;
        Ok(buf[0])
    }
    assert!(matches!(read_two(), Err(Error::CorruptData(_))));
}
