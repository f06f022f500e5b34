//! Scenario: typed grid config read from layered YAML.

use cg_config::{load_layered_yaml_from_strings, GridConfig};

const BASE_YAML: &str = r#"
grid:
  size: 10
cooldown:
  enabled: true
  duration_ms: 60000
history:
  grouping_window_ms: 1000
"#;

const ONE_SHOT_OVERLAY: &str = r#"
grid:
  size: 25
cooldown:
  enabled: false
server:
  addr: "0.0.0.0:3001"
"#;

#[test]
fn empty_document_yields_defaults() {
    let loaded = load_layered_yaml_from_strings(&[""]).unwrap();
    assert_eq!(loaded.grid_config().unwrap(), GridConfig::default());
}

#[test]
fn base_document_matches_defaults() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.grid_config().unwrap(), GridConfig::default());
}

#[test]
fn overlay_overrides_only_named_keys() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML, ONE_SHOT_OVERLAY]).unwrap();
    let cfg = loaded.grid_config().unwrap();

    assert_eq!(cfg.grid_size, 25);
    assert!(!cfg.cooldown_enabled);
    assert_eq!(cfg.cooldown_ms, 60_000, "untouched sibling must survive merge");
    assert_eq!(cfg.grouping_window_ms, 1_000);
    assert_eq!(cfg.server_addr, Some("0.0.0.0:3001".parse().unwrap()));
}

#[test]
fn zero_grid_size_rejected() {
    let loaded = load_layered_yaml_from_strings(&["grid:\n  size: 0\n"]).unwrap();
    let err = loaded.grid_config().unwrap_err().to_string();
    assert!(err.contains("CONFIG_INVALID"), "got: {err}");
    assert!(err.contains("/grid/size"), "got: {err}");
}

#[test]
fn wrong_type_rejected() {
    let loaded = load_layered_yaml_from_strings(&["cooldown:\n  enabled: \"yes\"\n"]).unwrap();
    assert!(loaded.grid_config().is_err());
}

#[test]
fn non_positive_window_rejected() {
    let loaded =
        load_layered_yaml_from_strings(&["history:\n  grouping_window_ms: 0\n"]).unwrap();
    assert!(loaded.grid_config().is_err());
}

#[test]
fn cooldown_duration_only_validated_when_enabled() {
    let bad = load_layered_yaml_from_strings(&["cooldown:\n  duration_ms: -5\n"]).unwrap();
    assert!(bad.grid_config().is_err());

    let one_shot = load_layered_yaml_from_strings(&[
        "cooldown:\n  enabled: false\n  duration_ms: 0\n",
    ])
    .unwrap();
    assert!(!one_shot.grid_config().unwrap().cooldown_enabled);
}

#[test]
fn bad_server_addr_rejected() {
    let loaded = load_layered_yaml_from_strings(&["server:\n  addr: \"not an addr\"\n"]).unwrap();
    assert!(loaded.grid_config().is_err());
}

#[test]
fn invalid_yaml_is_error() {
    assert!(load_layered_yaml_from_strings(&["grid: [unclosed"]).is_err());
}
