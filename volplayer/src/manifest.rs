/*!
    The asset manifest served at `<base>/manifest/frames.json`.

    Only a handful of fields are consumed. Parsing is lenient: unknown
    fields are ignored, and a field that is missing or has the wrong type
    keeps its default so a partially valid manifest still plays.
*/

use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub const DEFAULT_FPS: i32 = 16;
pub const DEFAULT_DEPTH_SCALE_FACTOR: f32 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Manifest {
    /// Media file name, relative to `<base>/frames/`.
    pub file: Option<String>,
    pub width: u32,
    pub height: u32,
    pub fps: i32,
    pub depth_scale_factor: f32,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            file: None,
            width: 0,
            height: 0,
            fps: DEFAULT_FPS,
            depth_scale_factor: DEFAULT_DEPTH_SCALE_FACTOR,
        }
    }
}

impl Manifest {
    /**
        Parse a manifest document.

        Fails only if the text is not a JSON object.
    */
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| Error::manifest(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(Error::manifest("root is not a JSON object"));
        };

        let defaults = Self::default();
        Ok(Self {
            file: field(&fields, "file", |v| {
                v.as_str().filter(|s| !s.is_empty()).map(str::to_owned)
            }),
            width: field(&fields, "width", as_u32).unwrap_or(defaults.width),
            height: field(&fields, "height", as_u32).unwrap_or(defaults.height),
            fps: field(&fields, "fps", |v| v.as_i64().and_then(|n| i32::try_from(n).ok()))
                .unwrap_or(defaults.fps),
            depth_scale_factor: field(&fields, "depth_scale_factor", |v| {
                v.as_f64().map(|n| n as f32)
            })
            .unwrap_or(defaults.depth_scale_factor),
        })
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

/**
    Extract one field, warning if it is present but unusable.
*/
fn field<T>(
    fields: &Map<String, Value>,
    name: &str,
    extract: impl FnOnce(&Value) -> Option<T>,
) -> Option<T> {
    let value = fields.get(name)?;
    let extracted = extract(value);
    if extracted.is_none() {
        tracing::warn!(field = name, %value, "ignoring invalid manifest field");
    }
    extracted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_fields() {
        let manifest = Manifest::parse(
            r#"{
                "file": "capture.webm",
                "width": 1024,
                "height": 768,
                "fps": 30,
                "depth_scale_factor": 0.25,
                "encoder": "unused"
            }"#,
        )
        .unwrap();

        assert_eq!(
            manifest,
            Manifest {
                file: Some("capture.webm".into()),
                width: 1024,
                height: 768,
                fps: 30,
                depth_scale_factor: 0.25,
            }
        );
    }

    #[test]
    fn missing_fields_keep_defaults() {
        let manifest = Manifest::parse("{}").unwrap();
        assert_eq!(manifest, Manifest::default());
        assert_eq!(manifest.fps, 16);
        assert_eq!(manifest.depth_scale_factor, 1.0);
    }

    #[test]
    fn mistyped_fields_keep_defaults() {
        let manifest = Manifest::parse(
            r#"{"file": 7, "width": "wide", "height": -1, "fps": 2.5, "depth_scale_factor": "x"}"#,
        )
        .unwrap();
        assert_eq!(manifest, Manifest::default());
    }

    #[test]
    fn invalid_documents_are_rejected() {
        assert!(matches!(Manifest::parse("not json"), Err(Error::Manifest(_))));
        assert!(matches!(Manifest::parse("[1, 2]"), Err(Error::Manifest(_))));
    }
}
