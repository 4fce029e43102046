use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

pub type SceneId = String;

/// Processing status of a scene as reported by the backend.
///
/// Wire values outside the known set deserialize to `Unknown` so that one odd
/// record cannot fail a whole collection read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl SceneStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SceneStatus::Pending => "pending",
            SceneStatus::Processing => "processing",
            SceneStatus::Completed => "completed",
            SceneStatus::Failed => "failed",
            SceneStatus::Unknown => "unknown",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SceneStatus::Pending => "Pending",
            SceneStatus::Processing => "Processing",
            SceneStatus::Completed => "Completed",
            SceneStatus::Failed => "Failed",
            SceneStatus::Unknown => "Unknown",
        }
    }

    /// Position in `pending -> processing -> {completed, failed}`.
    pub(crate) fn rank(self) -> Option<u8> {
        match self {
            SceneStatus::Pending => Some(0),
            SceneStatus::Processing => Some(1),
            SceneStatus::Completed | SceneStatus::Failed => Some(2),
            SceneStatus::Unknown => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SceneStatus::Completed | SceneStatus::Failed)
    }

    pub fn allows_view(self) -> bool {
        self == SceneStatus::Completed
    }

    pub fn allows_download(self) -> bool {
        self == SceneStatus::Completed
    }

    pub fn allows_delete(self) -> bool {
        self == SceneStatus::Failed
    }
}

/// Server-tracked record of one processing job.
///
/// Known fields are typed; everything else the backend sends is kept in
/// `extra` so accessors and search can still see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: SceneStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub nv_document: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Scene {
    /// A bare scene with only an id, mostly useful for tests and fixtures.
    pub fn new(id: impl Into<SceneId>) -> Self {
        Self {
            id: id.into(),
            tool_name: None,
            status: SceneStatus::Pending,
            timestamp: None,
            error: None,
            nv_document: Value::Null,
            result: None,
            extra: Map::new(),
        }
    }
}

fn lenient_status<'de, D>(deserializer: D) -> Result<SceneStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<SceneStatus>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Collection envelope returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenesPage {
    pub data: Vec<Scene>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneCreate {
    pub nv_document: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    pub status: SceneStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ToolParameters>,
}

/// Partial update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SceneUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nv_document: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SceneStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ToolParameters>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NiimathOperation {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl NiimathOperation {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Command-line rendering, e.g. `-add 2`.
    pub fn command_line(&self) -> String {
        std::iter::once(self.name.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tool", rename_all = "lowercase")]
pub enum ToolParameters {
    Niimath { operations: Vec<NiimathOperation> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingTool {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub takes_operations: bool,
}

pub const PROCESSING_TOOLS: &[ProcessingTool] = &[ProcessingTool {
    id: "niimath",
    name: "Niimath",
    description: "Perform mathematical operations on images",
    takes_operations: true,
}];

pub fn find_tool(id: &str) -> Option<&'static ProcessingTool> {
    PROCESSING_TOOLS.iter().find(|tool| tool.id == id)
}

/// Parameters to send with a submission, if the tool takes any.
pub fn tool_parameters(tool_id: &str, operations: &[NiimathOperation]) -> Option<ToolParameters> {
    let tool = find_tool(tool_id)?;
    if !tool.takes_operations || operations.is_empty() {
        return None;
    }
    match tool.id {
        "niimath" => Some(ToolParameters::Niimath {
            operations: operations.to_vec(),
        }),
        _ => None,
    }
}

/// One `imageOptionsArray` entry in the shape the viewer document expects.
pub fn image_option(id: &str, name: &str, url: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "url": url,
        "colormap": "gray",
        "opacity": 1,
    })
}

pub fn nv_document(title: &str, images: Vec<Value>) -> Value {
    json!({
        "title": title,
        "imageOptionsArray": images,
    })
}
