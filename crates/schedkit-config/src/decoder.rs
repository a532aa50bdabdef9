//! Decoding of opaque, content-type tagged plugin configuration.
//!
//! A [`RawConfiguration`] is produced while loading a scheduler profile and
//! handed to a plugin factory untouched. The factory calls [`decode_into`] to
//! populate its own typed arguments. YAML is converted to JSON before being
//! applied, so both encodings behave identically once parsed.

use std::any::Any;
use std::fmt;

use schedkit_common::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_YAML: &str = "application/yaml";

/// A configuration object as handed to a plugin factory.
///
/// Only [`RawConfiguration`] can be decoded; other implementors (typed args
/// built in code) are passed through to factories that know their shape.
pub trait RuntimeObject: Any + fmt::Debug + Send + Sync {
    /// Short type name used in error messages.
    fn kind(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    Json,
    Yaml,
    /// No content type given. Decoded as JSON.
    Unset,
    Unsupported(String),
}

impl ContentType {
    pub fn parse(content_type: &str) -> Self {
        let trimmed = content_type.trim();
        if trimmed.is_empty() {
            return Self::Unset;
        }
        match trimmed.to_ascii_lowercase().as_str() {
            CONTENT_TYPE_JSON | "json" => Self::Json,
            CONTENT_TYPE_YAML | "yaml" => Self::Yaml,
            _ => Self::Unsupported(content_type.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Json => CONTENT_TYPE_JSON,
            Self::Yaml => CONTENT_TYPE_YAML,
            Self::Unset => "",
            Self::Unsupported(other) => other,
        }
    }
}

impl From<&str> for ContentType {
    fn from(content_type: &str) -> Self {
        Self::parse(content_type)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration bytes tagged with the codec they are written in.
///
/// An empty payload means no configuration was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawConfiguration {
    Json(Vec<u8>),
    Yaml(Vec<u8>),
    Unset(Vec<u8>),
    Unsupported { content_type: String, raw: Vec<u8> },
}

impl RawConfiguration {
    pub const KIND: &'static str = "RawConfiguration";

    pub fn new(content_type: &str, raw: impl Into<Vec<u8>>) -> Self {
        let raw = raw.into();
        match ContentType::parse(content_type) {
            ContentType::Json => Self::Json(raw),
            ContentType::Yaml => Self::Yaml(raw),
            ContentType::Unset => Self::Unset(raw),
            ContentType::Unsupported(content_type) => Self::Unsupported { content_type, raw },
        }
    }

    pub fn json(raw: impl Into<Vec<u8>>) -> Self {
        Self::Json(raw.into())
    }

    pub fn yaml(raw: impl Into<Vec<u8>>) -> Self {
        Self::Yaml(raw.into())
    }

    /// Encode a structured value as a JSON blob.
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self::Json(serde_json::to_vec(value)?))
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Json(_) => ContentType::Json,
            Self::Yaml(_) => ContentType::Yaml,
            Self::Unset(_) => ContentType::Unset,
            Self::Unsupported { content_type, .. } => {
                ContentType::Unsupported(content_type.clone())
            }
        }
    }

    pub fn raw(&self) -> &[u8] {
        match self {
            Self::Json(raw) | Self::Yaml(raw) | Self::Unset(raw) => raw,
            Self::Unsupported { raw, .. } => raw,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw().is_empty()
    }

    /// Apply this blob onto `into`, keeping fields the blob does not mention.
    pub fn decode_into<T>(&self, into: &mut T) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        if self.is_empty() {
            return Ok(());
        }

        debug!(content_type = %self.content_type(), bytes = self.raw().len(), "decoding plugin args");
        let patch = match self {
            Self::Json(raw) | Self::Unset(raw) => serde_json::from_slice::<Value>(raw)?,
            Self::Yaml(raw) => yaml_to_json(raw)?,
            Self::Unsupported { content_type, .. } => {
                return Err(Error::UnsupportedContentType(content_type.clone()));
            }
        };
        apply(patch, into)
    }
}

impl RuntimeObject for RawConfiguration {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Decode `obj` into `into`.
///
/// `None` and empty blobs leave `into` at its current (default) value.
/// Otherwise the blob is merged into the serialized form of `into`: objects
/// merge key by key, `null` is ignored, and any other value replaces the
/// field. A one-key object whose key differs from the current one-key object
/// replaces it whole, so an enum field can switch variant.
///
/// `into` round-trips through serde, so fields marked `#[serde(skip)]` come
/// back as their `Default` value.
pub fn decode_into<T>(obj: Option<&dyn RuntimeObject>, into: &mut T) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let Some(obj) = obj else {
        return Ok(());
    };
    let raw = obj
        .as_any()
        .downcast_ref::<RawConfiguration>()
        .ok_or_else(|| Error::TypeMismatch {
            expected: RawConfiguration::KIND,
            got: obj.kind().to_string(),
        })?;
    raw.decode_into(into)
}

fn yaml_to_json(raw: &[u8]) -> Result<Value> {
    let value: serde_yaml::Value = serde_yaml::from_slice(raw)?;
    Ok(serde_json::to_value(value)?)
}

fn apply<T>(patch: Value, into: &mut T) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    // A document holding only `null` (or only YAML comments) carries no fields.
    if patch.is_null() {
        return Ok(());
    }
    let mut current = serde_json::to_value(&*into)?;
    merge_value(&mut current, patch);
    *into = serde_json::from_value(current)?;
    Ok(())
}

fn merge_value(target: &mut Value, patch: Value) {
    match (target, patch) {
        // `null` never clears a field, nested or not.
        (_, Value::Null) => {}
        // Externally tagged enum switching variant: merging would leave both tags.
        (Value::Object(target), Value::Object(patch))
            if target.len() == 1 && patch.len() == 1 && !shares_key(target, &patch) =>
        {
            *target = patch;
        }
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

fn shares_key(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.keys().any(|key| b.contains_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct FitArgs {
        strategy: String,
        weight: i64,
        #[serde(default)]
        shape: Vec<u32>,
        limits: Limits,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Limits {
        cpu: u32,
        memory: u32,
    }

    impl Default for FitArgs {
        fn default() -> Self {
            Self {
                strategy: "LeastAllocated".to_string(),
                weight: 1,
                shape: vec![0, 10],
                limits: Limits { cpu: 4, memory: 8 },
            }
        }
    }

    #[derive(Debug)]
    struct TypedArgs;

    impl RuntimeObject for TypedArgs {
        fn kind(&self) -> &str {
            "TypedArgs"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn content_type_parsing() {
        assert_eq!(ContentType::parse("application/json"), ContentType::Json);
        assert_eq!(ContentType::parse("JSON"), ContentType::Json);
        assert_eq!(ContentType::parse("application/yaml"), ContentType::Yaml);
        assert_eq!(ContentType::parse(""), ContentType::Unset);
        assert_eq!(
            ContentType::parse("xml"),
            ContentType::Unsupported("xml".to_string())
        );
    }

    #[test]
    fn absent_config_is_a_noop() {
        let mut cfg = FitArgs::default();
        decode_into(None, &mut cfg).unwrap();
        assert_eq!(cfg, FitArgs::default());
    }

    #[test]
    fn empty_raw_is_a_noop_for_every_content_type() {
        for blob in [
            RawConfiguration::json(Vec::new()),
            RawConfiguration::yaml(Vec::new()),
            RawConfiguration::Unset(Vec::new()),
            RawConfiguration::new("xml", Vec::new()),
        ] {
            let mut cfg = FitArgs::default();
            decode_into(Some(&blob), &mut cfg).unwrap();
            assert_eq!(cfg, FitArgs::default());
        }
    }

    #[test]
    fn json_into_map() {
        let blob = RawConfiguration::new(CONTENT_TYPE_JSON, r#"{"k":"v"}"#);
        let mut cfg: HashMap<String, String> = HashMap::new();
        decode_into(Some(&blob), &mut cfg).unwrap();
        assert_eq!(cfg.len(), 1);
        assert_eq!(cfg.get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn yaml_matches_json() {
        let mut from_json: HashMap<String, String> = HashMap::new();
        let mut from_yaml: HashMap<String, String> = HashMap::new();
        decode_into(Some(&RawConfiguration::json(r#"{"k":"v"}"#)), &mut from_json).unwrap();
        decode_into(Some(&RawConfiguration::yaml("k: v")), &mut from_yaml).unwrap();
        assert_eq!(from_json, from_yaml);
    }

    #[test]
    fn unset_content_type_decodes_as_json() {
        let blob = RawConfiguration::new("", r#"{"weight": 7}"#);
        let mut cfg = FitArgs::default();
        decode_into(Some(&blob), &mut cfg).unwrap();
        assert_eq!(cfg.weight, 7);
    }

    #[test]
    fn unsupported_content_type_names_the_type() {
        let blob = RawConfiguration::new("xml", "<args/>");
        let mut cfg = FitArgs::default();
        let err = decode_into(Some(&blob), &mut cfg).unwrap_err();
        assert!(matches!(&err, Error::UnsupportedContentType(ct) if ct == "xml"));
        assert!(err.to_string().contains("xml"));
        assert_eq!(cfg, FitArgs::default());
    }

    #[test]
    fn wrong_object_shape_is_a_type_mismatch() {
        let mut cfg = FitArgs::default();
        let err = decode_into(Some(&TypedArgs), &mut cfg).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { got, .. } if got == "TypedArgs"));
    }

    #[test]
    fn partial_blob_keeps_defaults_and_merges_nested_objects() {
        let blob = RawConfiguration::yaml("strategy: MostAllocated\nlimits:\n  cpu: 16\n");
        let mut cfg = FitArgs::default();
        decode_into(Some(&blob), &mut cfg).unwrap();
        assert_eq!(cfg.strategy, "MostAllocated");
        assert_eq!(cfg.weight, 1);
        assert_eq!(cfg.limits, Limits { cpu: 16, memory: 8 });
    }

    #[test]
    fn arrays_are_replaced_not_merged() {
        let blob = RawConfiguration::json(r#"{"shape":[5]}"#);
        let mut cfg = FitArgs::default();
        decode_into(Some(&blob), &mut cfg).unwrap();
        assert_eq!(cfg.shape, vec![5]);
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Placement {
        Fixed { nodes: u32 },
        Ratio { ratio: u32 },
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct PlacementArgs {
        placement: Placement,
        labels: HashMap<String, String>,
    }

    #[test]
    fn enum_field_can_switch_variant() {
        let mut cfg = PlacementArgs {
            placement: Placement::Fixed { nodes: 1 },
            labels: HashMap::new(),
        };
        decode_into(
            Some(&RawConfiguration::json(r#"{"placement":{"Ratio":{"ratio":2}}}"#)),
            &mut cfg,
        )
        .unwrap();
        assert_eq!(cfg.placement, Placement::Ratio { ratio: 2 });

        decode_into(
            Some(&RawConfiguration::yaml("placement:\n  Fixed:\n    nodes: 9\n")),
            &mut cfg,
        )
        .unwrap();
        assert_eq!(cfg.placement, Placement::Fixed { nodes: 9 });
    }

    #[test]
    fn same_variant_still_merges_fields() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        enum Window {
            Sliding { size: u32, step: u32 },
        }

        let mut cfg = Window::Sliding { size: 10, step: 2 };
        decode_into(
            Some(&RawConfiguration::json(r#"{"Sliding":{"step":5}}"#)),
            &mut cfg,
        )
        .unwrap();
        assert_eq!(cfg, Window::Sliding { size: 10, step: 5 });
    }

    #[test]
    fn nested_null_leaves_field_untouched() {
        let mut cfg = FitArgs::default();
        decode_into(
            Some(&RawConfiguration::json(
                r#"{"weight": null, "limits": {"cpu": null, "memory": 32}}"#,
            )),
            &mut cfg,
        )
        .unwrap();
        assert_eq!(cfg.weight, 1);
        assert_eq!(cfg.limits, Limits { cpu: 4, memory: 32 });

        let mut cfg = FitArgs::default();
        decode_into(Some(&RawConfiguration::yaml("strategy: ~\n")), &mut cfg).unwrap();
        assert_eq!(cfg, FitArgs::default());
    }

    #[test]
    fn skipped_fields_return_to_default() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct WithRuntimeState {
            weight: i64,
            #[serde(skip)]
            cached: u32,
        }

        let mut cfg = WithRuntimeState {
            weight: 1,
            cached: 42,
        };
        decode_into(Some(&RawConfiguration::json(r#"{"weight":3}"#)), &mut cfg).unwrap();
        assert_eq!(
            cfg,
            WithRuntimeState {
                weight: 3,
                cached: 0
            }
        );
    }

    #[test]
    fn comment_only_yaml_is_a_noop() {
        let blob = RawConfiguration::yaml("# nothing configured\n");
        let mut cfg = FitArgs::default();
        decode_into(Some(&blob), &mut cfg).unwrap();
        assert_eq!(cfg, FitArgs::default());
    }

    #[test]
    fn malformed_payloads_surface_codec_errors() {
        let mut cfg = FitArgs::default();
        let err = decode_into(Some(&RawConfiguration::json("{not json")), &mut cfg).unwrap_err();
        assert!(matches!(err, Error::Json(_)));

        let err = decode_into(Some(&RawConfiguration::yaml("a: [1, 2")), &mut cfg).unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));

        let err =
            decode_into(Some(&RawConfiguration::json(r#"{"weight":"heavy"}"#)), &mut cfg)
                .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert_eq!(cfg, FitArgs::default());
    }

    #[test]
    fn from_value_produces_json_blob() {
        let blob = RawConfiguration::from_value(&serde_json::json!({"weight": 3})).unwrap();
        assert_eq!(blob.content_type(), ContentType::Json);
        let mut cfg = FitArgs::default();
        blob.decode_into(&mut cfg).unwrap();
        assert_eq!(cfg.weight, 3);
    }
}
