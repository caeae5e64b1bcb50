//! Tests for error types

use sweepbench::Error;

#[test]
fn test_data_load_error() {
    let error = Error::DataLoad("iris unavailable".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Data load error"));
    assert!(error_str.contains("iris unavailable"));
}

#[test]
fn test_training_error() {
    let error = Error::Training("C must be positive".to_string());
    assert!(format!("{error}").contains("Training error: C must be positive"));
}

#[test]
fn test_export_unsupported_error() {
    let error = Error::ExportUnsupported("classifier".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Export unsupported"));
    assert!(error_str.contains("No model file was written"));
}

#[test]
fn test_session_load_error() {
    let error = Error::SessionLoad("truncated".to_string());
    assert!(format!("{error}").contains("Session load error"));
}

#[test]
fn test_metric_computation_error() {
    let error = Error::MetricComputation {
        predictions: 3,
        labels: 4,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Metric computation failed"));
    assert!(error_str.contains('3'));
    assert!(error_str.contains('4'));
}

#[test]
fn test_inference_error() {
    let error = Error::Inference("unknown input 'Y'".to_string());
    assert!(format!("{error}").contains("unknown input 'Y'"));
}

#[test]
fn test_tracking_error() {
    let error = Error::Tracking("unknown experiment".to_string());
    assert!(format!("{error}").contains("Tracking error"));
}

#[test]
fn test_invalid_config_error() {
    let error = Error::InvalidConfig("repetitions must be at least 1".to_string());
    assert!(format!("{error}").contains("Invalid configuration"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "model.onnx");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
    assert!(error_str.contains("model.onnx"));
}

#[test]
fn test_serialization_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("Serialization error"));
}

#[test]
fn test_error_debug() {
    let error = Error::Training("debug".to_string());
    assert!(format!("{error:?}").contains("Training"));
}
