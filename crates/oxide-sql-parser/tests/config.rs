//! Tests for loading parser options.

mod common;
use common::*;

use oxide_sql_parser::{ErrorKind, ParseMode, Parser, ParserConfig, DEFAULT_STACK_BUDGET};

#[test]
fn defaults() {
    let config = ParserConfig::default();
    assert_eq!(config.mode, ParseMode::Production);
    assert_eq!(config.max_depth, 1000);
    assert_eq!(config.stack_budget, DEFAULT_STACK_BUDGET);
    assert!(!config.compact_tree);
    assert!(!config.strict_ansi);
    assert!(config.allow_extensions);
    assert_eq!(Parser::new().config(), &config);
}

#[test]
fn empty_object_is_the_default() {
    let config: ParserConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, ParserConfig::default());
}

#[test]
fn every_field_loads() {
    let json = r#"{
        "mode": "permissive",
        "max_depth": 64,
        "stack_budget": 0,
        "compact_tree": true,
        "strict_ansi": true,
        "allow_extensions": false
    }"#;
    let config: ParserConfig = serde_json::from_str(json).unwrap();
    assert_eq!(
        config,
        ParserConfig::default()
            .with_mode(ParseMode::Permissive)
            .with_max_depth(64)
            .with_stack_budget(0)
            .with_compact_tree(true)
            .with_strict_ansi(true)
            .with_extensions(false)
    );
}

#[test]
fn serialized_config_loads_back() {
    let config = ParserConfig::default()
        .with_mode(ParseMode::Permissive)
        .with_max_depth(12);
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains(r#""mode":"permissive""#), "{json}");
    let loaded: ParserConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn unknown_mode_is_rejected() {
    let err = serde_json::from_str::<ParserConfig>(r#"{"mode": "lenient"}"#).unwrap_err();
    assert!(err.to_string().contains("lenient"), "{err}");
}

#[test]
fn loaded_config_drives_the_parser() {
    let config: ParserConfig =
        serde_json::from_str(r#"{"mode": "permissive", "max_depth": 4}"#).unwrap();
    with_config(config.clone(), "SELECT * FROM a JOIN b", |_| {});
    let err = parse_err_with(config, "SELECT ((((1))))");
    assert_eq!(err.kind, ErrorKind::DepthExceeded);
}
