//! Persisted value records
//!
//! The values file is either an array of per-output records or a single shared
//! record whose values are applied to every output it lists.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::constants::xrandr::GAMMA_SEPARATOR;

/// Red, green and blue gamma multipliers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gamma(pub [f64; 3]);

impl Gamma {
    #[cfg(test)]
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self([red, green, blue])
    }

    /// Move every channel by `step * sign`
    pub fn offset(self, step: Gamma, sign: f64) -> Self {
        let [r, g, b] = self.0;
        let [dr, dg, db] = step.0;
        Self([r + dr * sign, g + dg * sign, b + db * sign])
    }
}

/// Formats as `R:G:B`, the form xrandr takes for `--gamma`
impl fmt::Display for Gamma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "{r}{sep}{g}{sep}{b}", sep = GAMMA_SEPARATOR)
    }
}

impl FromStr for Gamma {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(GAMMA_SEPARATOR).collect();
        let [r, g, b] = parts.as_slice() else {
            bail!("expected three '{GAMMA_SEPARATOR}'-separated values, got '{s}'");
        };
        let channel = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .with_context(|| format!("invalid gamma component '{raw}'"))
        };
        Ok(Self([channel(*r)?, channel(*g)?, channel(*b)?]))
    }
}

/// The two values actually sent to xrandr for an output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub gamma: Gamma,
    pub brightness: f64,
}

/// Per-record step overrides as written in the file
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOverrides {
    pub brightness: Option<f64>,
    pub gamma: Option<Gamma>,
}

/// Current values for one xrandr output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Name known by xrandr (e.g. `HDMI-1`)
    #[serde(rename = "output", alias = "name")]
    pub name: String,

    /// Optional shorthand the user may type instead of the output name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    pub gamma: Gamma,
    pub brightness: f64,

    #[serde(rename = "gamma_delta", default, skip_serializing_if = "Option::is_none")]
    pub gamma_step: Option<Gamma>,

    #[serde(rename = "brightness_delta", default, skip_serializing_if = "Option::is_none")]
    pub brightness_step: Option<f64>,

    /// Keys this tool does not interpret, written back untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OutputRecord {
    #[cfg(test)]
    pub fn new(name: impl Into<String>, gamma: Gamma, brightness: f64) -> Self {
        Self {
            name: name.into(),
            alias: None,
            gamma,
            brightness,
            gamma_step: None,
            brightness_step: None,
            extra: Map::new(),
        }
    }

    pub fn levels(&self) -> Levels {
        Levels {
            gamma: self.gamma,
            brightness: self.brightness,
        }
    }

    pub fn step_overrides(&self) -> StepOverrides {
        StepOverrides {
            brightness: self.brightness_step,
            gamma: self.gamma_step,
        }
    }

    /// Copy of this record carrying new values
    pub fn with_levels(&self, levels: Levels) -> Self {
        Self {
            gamma: levels.gamma,
            brightness: levels.brightness,
            ..self.clone()
        }
    }
}

/// One set of values shared by several outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedRecord {
    pub outputs: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    pub gamma: Gamma,
    pub brightness: f64,

    #[serde(rename = "gamma_delta", default, skip_serializing_if = "Option::is_none")]
    pub gamma_step: Option<Gamma>,

    #[serde(rename = "brightness_delta", default, skip_serializing_if = "Option::is_none")]
    pub brightness_step: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SharedRecord {
    pub fn levels(&self) -> Levels {
        Levels {
            gamma: self.gamma,
            brightness: self.brightness,
        }
    }

    pub fn step_overrides(&self) -> StepOverrides {
        StepOverrides {
            brightness: self.brightness_step,
            gamma: self.gamma_step,
        }
    }

    pub fn with_levels(&self, levels: Levels) -> Self {
        Self {
            gamma: levels.gamma,
            brightness: levels.brightness,
            ..self.clone()
        }
    }

    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(String::as_str).collect()
    }
}

/// Contents of a values file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateDocument {
    PerOutput(Vec<OutputRecord>),
    Shared(SharedRecord),
}

/// An output name paired with the values xrandr should apply to it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputValues<'a> {
    pub output: &'a str,
    pub levels: Levels,
}

impl StateDocument {
    /// Parse a values file, reporting which record is malformed
    pub fn parse(contents: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(contents).context("values file is not valid JSON")?;
        match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    serde_json::from_value::<OutputRecord>(item)
                        .with_context(|| format!("invalid output record at index {index}"))
                })
                .collect::<Result<Vec<_>>>()
                .map(StateDocument::PerOutput),
            Value::Object(_) => serde_json::from_value::<SharedRecord>(value)
                .map(StateDocument::Shared)
                .context("invalid shared record"),
            other => bail!(
                "values file must hold an array of outputs or a single object, found {}",
                json_kind(&other)
            ),
        }
    }

    /// Values for every output, in file order
    pub fn output_values(&self) -> Vec<OutputValues<'_>> {
        match self {
            StateDocument::PerOutput(records) => records
                .iter()
                .map(|record| OutputValues {
                    output: &record.name,
                    levels: record.levels(),
                })
                .collect(),
            StateDocument::Shared(shared) => shared
                .outputs
                .iter()
                .map(|output| OutputValues {
                    output,
                    levels: shared.levels(),
                })
                .collect(),
        }
    }

    /// Recorded values for a named output, if this document knows it
    pub fn levels_for(&self, output: &str) -> Option<Levels> {
        match self {
            StateDocument::PerOutput(records) => records
                .iter()
                .find(|record| record.name == output)
                .map(OutputRecord::levels),
            StateDocument::Shared(shared) => shared
                .outputs
                .iter()
                .any(|name| name == output)
                .then(|| shared.levels()),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gamma_display_uses_shortest_decimals() {
        assert_eq!(Gamma::new(1.0, 1.0, 1.0).to_string(), "1:1:1");
        assert_eq!(Gamma::new(1.0, 1.025, 1.05).to_string(), "1:1.025:1.05");
        assert_eq!(Gamma::new(0.5, -0.25, 2.0).to_string(), "0.5:-0.25:2");
    }

    #[test]
    fn test_gamma_from_str() {
        let gamma: Gamma = "0:0.025:0.05".parse().unwrap();
        assert_eq!(gamma, Gamma::new(0.0, 0.025, 0.05));

        assert!("1:1".parse::<Gamma>().is_err());
        assert!("1:1:1:1".parse::<Gamma>().is_err());
        assert!("1:x:1".parse::<Gamma>().is_err());
    }

    #[test]
    fn test_gamma_offset_sign() {
        let base = Gamma::new(1.0, 1.0, 1.0);
        let step = Gamma::new(0.0, 0.25, 0.5);
        assert_eq!(base.offset(step, 1.0), Gamma::new(1.0, 1.25, 1.5));
        assert_eq!(base.offset(step, -1.0), Gamma::new(1.0, 0.75, 0.5));
    }

    #[test]
    fn test_parse_per_output_document() {
        let doc = StateDocument::parse(
            r#"[
                {"output": "HDMI-1", "alias": "left", "gamma": [1, 1, 1], "brightness": 1,
                 "gamma_delta": [0.5, 0.5, 0.5], "brightness_delta": 0.2},
                {"name": "DP-2", "gamma": [0.9, 1.0, 1.1], "brightness": 0.8}
            ]"#,
        )
        .unwrap();

        let StateDocument::PerOutput(records) = doc else {
            panic!("expected per-output document");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "HDMI-1");
        assert_eq!(records[0].alias.as_deref(), Some("left"));
        assert_eq!(records[0].gamma_step, Some(Gamma::new(0.5, 0.5, 0.5)));
        assert_eq!(records[0].brightness_step, Some(0.2));
        assert_eq!(records[1].name, "DP-2");
        assert_eq!(records[1].alias, None);
        assert_eq!(records[1].brightness, 0.8);
    }

    #[test]
    fn test_parse_shared_document() {
        let doc = StateDocument::parse(
            r#"{"outputs": ["HDMI-1", "DP-2"], "gamma": [1, 1, 1], "brightness": 0.7}"#,
        )
        .unwrap();

        let values = doc.output_values();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].output, "HDMI-1");
        assert_eq!(values[1].output, "DP-2");
        assert_eq!(values[1].levels.brightness, 0.7);
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let err = StateDocument::parse(r#"[{"output": "HDMI-1", "brightness": 1.0}]"#).unwrap_err();
        assert!(format!("{err:#}").contains("index 0"));

        assert!(StateDocument::parse(r#"[{"gamma": [1, 1, 1], "brightness": 1.0}]"#).is_err());
        assert!(StateDocument::parse(r#"[{"output": "HDMI-1", "gamma": [1, 1, 1]}]"#).is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_gamma_length() {
        assert!(StateDocument::parse(r#"[{"output": "A", "gamma": [1, 1], "brightness": 1.0}]"#).is_err());
        assert!(
            StateDocument::parse(r#"[{"output": "A", "gamma": [1, 1, 1, 1], "brightness": 1.0}]"#).is_err()
        );
    }

    #[test]
    fn test_parse_rejects_scalar_document() {
        let err = StateDocument::parse("42").unwrap_err();
        assert!(err.to_string().contains("a number"));
        assert!(StateDocument::parse("not json").is_err());
    }

    #[test]
    fn test_unknown_keys_survive_serialization() {
        let doc = StateDocument::parse(
            r#"[{"output": "HDMI-1", "gamma": [1, 1, 1], "brightness": 1.0, "note": "desk"}]"#,
        )
        .unwrap();

        let written = serde_json::to_string(&doc).unwrap();
        assert!(written.contains(r#""note":"desk""#));
        assert!(written.contains(r#""output":"HDMI-1""#));
        assert!(!written.contains("alias"));
        assert!(!written.contains("gamma_delta"));
    }

    #[test]
    fn test_levels_for() {
        let doc = StateDocument::PerOutput(vec![
            OutputRecord::new("HDMI-1", Gamma::new(1.0, 1.0, 1.0), 1.0),
            OutputRecord::new("DP-2", Gamma::new(0.8, 0.9, 1.0), 0.5),
        ]);
        let levels = doc.levels_for("DP-2").unwrap();
        assert_eq!(levels.gamma, Gamma::new(0.8, 0.9, 1.0));
        assert_eq!(levels.brightness, 0.5);
        assert!(doc.levels_for("eDP-1").is_none());
    }
}
