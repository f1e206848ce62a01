//! Backend replies and the notice each one maps to.

use crate::core::catalog::Provenance;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Reply to a summary, comparison, annotation or result request
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default, rename = "ID", alias = "id", deserialize_with = "string_or_number")]
    pub id: Option<String>,
}

/// Job ids come back as numbers from some deployments
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl JobResponse {
    /// Accepts an object, or a bare JSON string which is taken as the status
    /// (the backend prints `"ERROR"` when it crashes).
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        match value {
            Value::String(status) => Ok(Self {
                status: status.clone(),
                ..Self::default()
            }),
            Value::Object(_) => serde_json::from_value(value.clone()),
            other => Err(serde::de::Error::custom(format!(
                "expected a job object or status string, got {other}"
            ))),
        }
    }
}

/// What the user is told about a job reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success { url: String, view: String },
    ImagePreview { url: String, view: String },
    Empty,
    Invalid,
    Failure,
    Launched { id: String },
    Waiting { id: String },
    Unrecognized { status: String },
}

impl From<JobResponse> for JobOutcome {
    fn from(response: JobResponse) -> Self {
        let url = response.url.unwrap_or_default();
        let view = response.view.unwrap_or_default();
        let id = response.id.unwrap_or_default();
        match response.status.as_str() {
            "DONE" if url.ends_with(".txt") => Self::ImagePreview { url, view },
            "DONE" => Self::Success { url, view },
            "EMPTY" => Self::Empty,
            "INVALID" => Self::Invalid,
            "ERROR" => Self::Failure,
            "LAUNCHED" => Self::Launched { id },
            "WAITING" => Self::Waiting { id },
            other => {
                warn!("Unrecognized job status '{}'", other);
                Self::Unrecognized { status: other.to_string() }
            }
        }
    }
}

impl JobOutcome {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Success { .. } => "Success",
            Self::ImagePreview { .. } => "Preview ready",
            Self::Empty => "Empty result",
            Self::Invalid => "Invalid query",
            Self::Failure => "Failure",
            Self::Launched { .. } => "Job launched",
            Self::Waiting { .. } => "Still running",
            Self::Unrecognized { .. } => "Unrecognized response",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Success { url, view } => {
                format!("Result track:\n{url}\n\nView in genome browser:\n{view}")
            }
            Self::ImagePreview { url, view } => {
                format!("Result table:\n{url}\n\nPreview image:\n{view}")
            }
            Self::Empty => "The query selected no datasets.".to_string(),
            Self::Invalid => "The backend rejected the query as invalid.".to_string(),
            Self::Failure => "The computation failed on the server.".to_string(),
            Self::Launched { id } => {
                format!("The computation was queued as job {id}.\nUse the Result tab to check on it.")
            }
            Self::Waiting { id } => format!("Job {id} has not finished yet."),
            Self::Unrecognized { status } => {
                format!("The backend answered with an unknown status: '{status}'")
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Empty | Self::Invalid | Self::Failure | Self::Unrecognized { .. }
        )
    }
}

/// Reply to an upload request
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded,
    Malformed { url: String, format: String },
    Failed { url: String },
}

impl UploadOutcome {
    /// `submitted` is reported when the reply does not echo the URL back
    pub fn from_response(response: UploadResponse, submitted: &str) -> Self {
        if response.status.as_deref() == Some("UPLOADED") {
            return Self::Uploaded;
        }
        let url = response.url.unwrap_or_else(|| submitted.to_string());
        match response.format {
            Some(format) => Self::Malformed { url, format },
            None => Self::Failed { url },
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Uploaded => "Upload complete",
            Self::Malformed { .. } => "Malformed file",
            Self::Failed { .. } => "Upload failed",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Uploaded => "The dataset was registered and can be used as an annotation.".to_string(),
            Self::Malformed { url, format } => {
                format!("{url}\ndoes not look like a valid {format} file.")
            }
            Self::Failed { url } => format!("Could not fetch or register\n{url}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AnnotationsResponse {
    #[serde(default)]
    pub annotations: Vec<String>,
}

/// Provenance reply; anything that is not an object is kept as the
/// description text.
pub fn provenance_from_value(name: &str, value: &Value) -> Provenance {
    match value {
        Value::Object(map) => Provenance {
            name: map
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(name)
                .to_string(),
            description: map
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
        },
        Value::String(text) => Provenance {
            name: name.to_string(),
            description: text.clone(),
        },
        other => Provenance {
            name: name.to_string(),
            description: other.to_string(),
        },
    }
}
