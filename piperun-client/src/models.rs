//! Request and response bodies of the pipelines API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Body of a run-pipeline request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPipelineRequest {
    pub resources: JsonValue,
    pub template_parameters: BTreeMap<String, JsonValue>,
}

impl RunPipelineRequest {
    /// Run the pipeline on `refs/heads/<branch>` with the given template parameters
    pub fn new(branch: &str, template_parameters: BTreeMap<String, JsonValue>) -> Self {
        Self {
            resources: json!({
                "repositories": {
                    "self": { "refName": format!("refs/heads/{}", branch) }
                }
            }),
            template_parameters,
        }
    }
}

/// A pipeline run as returned by the service
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineRun {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

/// Envelope of the approvals query
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalList {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub value: Vec<PipelineApproval>,
}

/// A manual approval gate
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineApproval {
    pub id: Uuid,
    pub status: String,
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pipeline: Option<PipelineReference>,
}

/// The pipeline definition an approval belongs to
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineReference {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner: Option<PipelineOwner>,
}

/// The run an approval gates
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineOwner {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl PipelineApproval {
    /// Whether this approval gates the given run of the given definition
    pub fn belongs_to(&self, definition_id: &str, run_id: &str) -> bool {
        self.pipeline.as_ref().is_some_and(|pipeline| {
            pipeline.id == definition_id
                && pipeline.owner.as_ref().is_some_and(|owner| owner.id == run_id)
        })
    }
}

/// One entry of an approvals update request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalUpdate {
    pub approval_id: Uuid,
    pub status: String,
    pub comment: String,
}

impl ApprovalUpdate {
    pub fn approve(approval_id: Uuid, comment: impl Into<String>) -> Self {
        Self {
            approval_id,
            status: "approved".to_string(),
            comment: comment.into(),
        }
    }
}

/// Identifiers come back as numbers or strings depending on the endpoint
fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_request_body() {
        let mut params = BTreeMap::new();
        params.insert("env".to_string(), json!("qa"));
        let body = serde_json::to_value(RunPipelineRequest::new("release/1.2", params)).unwrap();

        assert_eq!(
            body["resources"]["repositories"]["self"]["refName"],
            json!("refs/heads/release/1.2")
        );
        assert_eq!(body["templateParameters"]["env"], json!("qa"));
    }

    #[test]
    fn test_parse_run_without_result() {
        let run: PipelineRun =
            serde_json::from_value(json!({ "id": 1234, "state": "inProgress" })).unwrap();
        assert_eq!(run.id, "1234");
        assert_eq!(run.state.as_deref(), Some("inProgress"));
        assert!(run.result.is_none());
    }

    #[test]
    fn test_approval_scope() {
        let list: ApprovalList = serde_json::from_value(json!({
            "count": 1,
            "value": [{
                "id": "a1b2c3d4-0000-0000-0000-000000000001",
                "status": "pending",
                "createdOn": "2026-03-01T10:00:00Z",
                "pipeline": { "id": "42", "name": "deploy", "owner": { "id": 1234, "name": "20260301.1" } }
            }]
        }))
        .unwrap();

        let approval = &list.value[0];
        assert!(approval.belongs_to("42", "1234"));
        assert!(!approval.belongs_to("42", "999"));
        assert!(!approval.belongs_to("7", "1234"));
    }

    #[test]
    fn test_approval_update_body() {
        let id = Uuid::new_v4();
        let body = serde_json::to_value(vec![ApprovalUpdate::approve(id, "ok")]).unwrap();
        assert_eq!(body[0]["approvalId"], json!(id.to_string()));
        assert_eq!(body[0]["status"], json!("approved"));
    }
}
