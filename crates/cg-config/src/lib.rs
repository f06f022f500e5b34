//! Layered YAML configuration for the grid daemon.
//!
//! Documents are deep-merged in order (later overrides earlier), rendered to
//! canonical JSON, and hashed so a running process can report exactly which
//! configuration it booted with. [`GridConfig`] is the typed view the daemon
//! consumes; anything in the documents it does not read shows up in
//! [`report_unused_keys`].

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::net::SocketAddr;

pub const DEFAULT_GRID_SIZE: u64 = 10;
pub const MAX_GRID_SIZE: u64 = 1_000;
pub const DEFAULT_COOLDOWN_MS: i64 = 60_000;
pub const DEFAULT_GROUPING_WINDOW_MS: i64 = 1_000;

/// Every leaf pointer [`GridConfig::from_config_json`] reads.
pub const CONSUMED_POINTERS: &[&str] = &[
    "/grid/size",
    "/cooldown/enabled",
    "/cooldown/duration_ms",
    "/history/grouping_window_ms",
    "/server/addr",
];

// ---------------------------------------------------------------------------
// Typed config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub grid_size: usize,
    /// false = one write per session, ever.
    pub cooldown_enabled: bool,
    pub cooldown_ms: i64,
    pub grouping_window_ms: i64,
    pub server_addr: Option<SocketAddr>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE as usize,
            cooldown_enabled: true,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            grouping_window_ms: DEFAULT_GROUPING_WINDOW_MS,
            server_addr: None,
        }
    }
}

impl GridConfig {
    /// Read the typed config out of a merged JSON document. Missing keys take
    /// their defaults; wrong types and out-of-range values are errors.
    pub fn from_config_json(v: &Value) -> Result<Self> {
        let grid_size = match read_u64(v, "/grid/size")? {
            Some(n) if (1..=MAX_GRID_SIZE).contains(&n) => n as usize,
            Some(n) => bail!("CONFIG_INVALID key=/grid/size value={n} (expected 1..={MAX_GRID_SIZE})"),
            None => DEFAULT_GRID_SIZE as usize,
        };

        let cooldown_enabled = read_bool(v, "/cooldown/enabled")?.unwrap_or(true);

        let cooldown_ms = read_i64(v, "/cooldown/duration_ms")?.unwrap_or(DEFAULT_COOLDOWN_MS);
        if cooldown_enabled && cooldown_ms <= 0 {
            bail!("CONFIG_INVALID key=/cooldown/duration_ms value={cooldown_ms} (must be > 0 when cooldown is enabled)");
        }

        let grouping_window_ms =
            read_i64(v, "/history/grouping_window_ms")?.unwrap_or(DEFAULT_GROUPING_WINDOW_MS);
        if grouping_window_ms <= 0 {
            bail!("CONFIG_INVALID key=/history/grouping_window_ms value={grouping_window_ms} (must be > 0)");
        }

        let server_addr = match read_str(v, "/server/addr")? {
            Some(s) => Some(
                s.parse::<SocketAddr>()
                    .with_context(|| format!("CONFIG_INVALID key=/server/addr value={s}"))?,
            ),
            None => None,
        };

        Ok(Self {
            grid_size,
            cooldown_enabled,
            cooldown_ms,
            grouping_window_ms,
            server_addr,
        })
    }
}

fn read_u64(v: &Value, ptr: &str) -> Result<Option<u64>> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(x) => match x.as_u64() {
            Some(n) => Ok(Some(n)),
            None => bail!("CONFIG_INVALID key={ptr} (expected non-negative integer, got {x})"),
        },
    }
}

fn read_i64(v: &Value, ptr: &str) -> Result<Option<i64>> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(x) => match x.as_i64() {
            Some(n) => Ok(Some(n)),
            None => bail!("CONFIG_INVALID key={ptr} (expected integer, got {x})"),
        },
    }
}

fn read_bool(v: &Value, ptr: &str) -> Result<Option<bool>> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(x) => match x.as_bool() {
            Some(b) => Ok(Some(b)),
            None => bail!("CONFIG_INVALID key={ptr} (expected bool, got {x})"),
        },
    }
}

fn read_str<'a>(v: &'a Value, ptr: &str) -> Result<Option<&'a str>> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(x) => match x.as_str() {
            Some(s) => Ok(Some(s)),
            None => bail!("CONFIG_INVALID key={ptr} (expected string, got {x})"),
        },
    }
}

// ---------------------------------------------------------------------------
// Unused-key guard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Leaf pointers present in the config but never read (sorted).
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Report config leaves that [`GridConfig`] does not consume.
/// With `UnusedKeyPolicy::Fail`, a non-empty report is an error.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|leaf| !CONSUMED_POINTERS.iter().any(|p| is_prefix_pointer(p, leaf)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused config leaf key(s) detected: {:?}",
            report.unused_leaf_pointers.len(),
            report.unused_leaf_pointers
        );
    }

    Ok(report)
}

/// "/a/b" covers "/a/b" and "/a/b/c" but not "/a/bc".
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    leaf == prefix
        || leaf
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map {
                let next = format!("{}/{}", prefix, k.replace('~', "~0").replace('/', "~1"));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                collect_leaf_pointers(vv, &format!("{prefix}/{i}"), out);
            }
        }
        _ => out.push(if prefix.is_empty() {
            "/".to_string()
        } else {
            prefix.to_string()
        }),
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    pub fn grid_config(&self) -> Result<GridConfig> {
        GridConfig::from_config_json(&self.config_json)
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        // An empty document parses as null; treat it as "no overrides".
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    // serde_json::Map is BTreeMap-backed here, so key order is canonical.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_pointer_respects_segment_boundary() {
        assert!(is_prefix_pointer("/grid/size", "/grid/size"));
        assert!(is_prefix_pointer("/grid", "/grid/size"));
        assert!(!is_prefix_pointer("/grid/size", "/grid/sizes"));
    }

    #[test]
    fn deep_merge_overrides_leaves_and_keeps_siblings() {
        let a = serde_json::json!({"cooldown": {"enabled": true, "duration_ms": 5}});
        let b = serde_json::json!({"cooldown": {"duration_ms": 9}});
        assert_eq!(
            deep_merge(a, b),
            serde_json::json!({"cooldown": {"enabled": true, "duration_ms": 9}})
        );
    }
}
