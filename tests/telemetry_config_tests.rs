//! Tests for LogFormat.

use kafkaesque_client::telemetry::LogFormat;

#[test]
fn test_log_format_default_is_pretty() {
    assert_eq!(LogFormat::default(), LogFormat::Pretty);
}

#[test]
fn test_log_format_parse() {
    assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
}

#[test]
fn test_log_format_unknown_falls_back_to_pretty() {
    assert_eq!("xml".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
    assert_eq!("".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
}

#[test]
fn test_log_format_copy() {
    let format = LogFormat::Json;
    let copied = format;
    assert_eq!(format, copied);
}
