use thermex_core::error::{ErrorCategory, ExtractError};
use thermex_core::pipeline::config::{ExtractionConfig, ExtractionMode, OutputFormat};
use thermex_core::pipeline::Extractor;

#[test]
fn test_defaults() {
    let config = ExtractionConfig::default();
    assert_eq!(config.mode, ExtractionMode::Interval);
    assert_eq!(config.interval, 1);
    assert_eq!(config.similarity_threshold, 0.8);
    assert_eq!(config.output_format, OutputFormat::Png);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config: ExtractionConfig = toml::from_str(
        r#"
        mode = "dynamic"
        similarity_threshold = 0.65
        "#,
    )
    .unwrap();
    assert_eq!(config.mode, ExtractionMode::Dynamic);
    assert_eq!(config.similarity_threshold, 0.65);
    assert_eq!(config.interval, 1);
    assert_eq!(config.output_format, OutputFormat::Png);
}

#[test]
fn test_full_toml() {
    let config: ExtractionConfig = toml::from_str(
        r#"
        mode = "interval"
        interval = 15
        output_format = "jpeg"
        "#,
    )
    .unwrap();
    assert_eq!(config, ExtractionConfig::interval(15).with_output_format(OutputFormat::Jpeg));
}

#[test]
fn test_toml_round_trip_of_defaults() {
    let text = toml::to_string_pretty(&ExtractionConfig::default()).unwrap();
    assert!(text.contains("mode = \"interval\""));
    let parsed: ExtractionConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed, ExtractionConfig::default());
}

#[test]
fn test_unknown_format_is_rejected() {
    let parsed: Result<ExtractionConfig, _> = toml::from_str("output_format = \"bmp\"");
    assert!(parsed.is_err());
}

#[test]
fn test_zero_interval_is_invalid() {
    let err = ExtractionConfig::interval(0).validate().unwrap_err();
    assert!(matches!(err, ExtractError::InvalidConfig(_)));
    assert_eq!(err.category(), ErrorCategory::Config);
    assert!(Extractor::new(ExtractionConfig::interval(0)).is_err());
}

#[test]
fn test_threshold_range() {
    for bad in [0.0, -0.5, 1.01, f64::NAN] {
        let err = ExtractionConfig::dynamic(bad).validate().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config, "threshold {bad}");
    }
    for good in [0.001, 0.5, 1.0] {
        assert!(ExtractionConfig::dynamic(good).validate().is_ok());
    }
}

#[test]
fn test_display() {
    assert_eq!(ExtractionMode::Dynamic.to_string(), "Dynamic");
    assert_eq!(OutputFormat::Jpeg.to_string(), "JPEG");
    assert_eq!(OutputFormat::Jpeg.extension(), "jpeg");
    assert_eq!(OutputFormat::Png.extension(), "png");
}
