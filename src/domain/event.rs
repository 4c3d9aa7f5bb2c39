use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    IssueCreated,
    IssueUpdated,
    IssueCommentCreated,
    ProjectCreated,
    Unknown(String),
}

impl EventKind {
    pub fn parse(tag: &str) -> Self {
        match tag.trim() {
            "issue.created" => EventKind::IssueCreated,
            "issue.updated" => EventKind::IssueUpdated,
            "issue_comment.created" => EventKind::IssueCommentCreated,
            "project.created" => EventKind::ProjectCreated,
            other => EventKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::IssueCreated => "issue.created",
            EventKind::IssueUpdated => "issue.updated",
            EventKind::IssueCommentCreated => "issue_comment.created",
            EventKind::ProjectCreated => "project.created",
            EventKind::Unknown(tag) => tag,
        }
    }
}

/// Fields read from issue events. Trackers send either `name` or `title`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueEventData {
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<Value>,
    pub description_stripped: Option<String>,
}

impl IssueEventData {
    /// A non-blank `name` wins over `title` when both are present.
    pub fn name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(self.title.as_deref())
    }

    /// Plain-text description; rich-text objects are ignored.
    pub fn description_text(&self) -> Option<&str> {
        self.description_stripped
            .as_deref()
            .or_else(|| self.description.as_ref().and_then(Value::as_str))
    }

    pub fn text(&self) -> String {
        match (self.name(), self.description_text()) {
            (Some(name), Some(description)) if !description.trim().is_empty() => {
                format!("{}. {}", name.trim(), description.trim())
            }
            (Some(name), _) => name.trim().to_string(),
            (None, Some(description)) => description.trim().to_string(),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentEventData {
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: Option<String>,
    #[serde(default, alias = "issue_id", deserialize_with = "id_as_string")]
    pub issue: Option<String>,
    pub comment: Option<String>,
    pub comment_stripped: Option<String>,
    pub comment_html: Option<String>,
}

impl CommentEventData {
    pub fn text(&self) -> Option<&str> {
        self.comment_stripped
            .as_deref()
            .or(self.comment.as_deref())
            .or(self.comment_html.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectEventData {
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub identifier: Option<String>,
}

/// Remote ids arrive as strings or numbers depending on the tracker.
pub fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_id))
}
