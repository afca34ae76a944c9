use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One employee row as returned by the directory API. Fields are kept
/// verbatim so unknown columns survive the trip to CSV/JSON unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Employee {
    pub fields: Map<String, Value>,
}

impl Employee {
    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }

    pub fn profile_url(&self) -> Option<&str> {
        self.fields.get("profileUrl").and_then(Value::as_str)
    }

    /// Dedup identity: the profile link when the API sent one, otherwise
    /// the whole serialized record.
    pub fn dedup_key(&self) -> String {
        match self.profile_url() {
            Some(link) => link.to_string(),
            None => serde_json::to_string(&self.fields).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub decision_makers: Vec<Employee>,
    pub total_scanned: usize,
    pub csv_output: String,
    pub json_output: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
    Both,
}

impl OutputFormat {
    pub fn includes_csv(self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }

    pub fn includes_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "both" => Ok(OutputFormat::Both),
            other => Err(format!(
                "unknown output format '{other}', expected csv, json or both"
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Both => "both",
        })
    }
}
