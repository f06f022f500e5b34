//! Scenario: config hash is deterministic and order-insensitive.

use cg_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
grid:
  size: 10
cooldown:
  enabled: true
  duration_ms: 60000
"#;

const BASE_YAML_REORDERED: &str = r#"
cooldown:
  duration_ms: 60000
  enabled: true
grid:
  size: 10
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
    assert_eq!(a.config_hash.len(), 64, "sha256 hex");
}

#[test]
fn key_order_does_not_change_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
}

#[test]
fn different_values_produce_different_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, "grid:\n  size: 11\n"]).unwrap();
    assert_ne!(a.config_hash, b.config_hash);
}
