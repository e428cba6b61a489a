//! Request/response types exchanged with the engine worker.

use serde::{Deserialize, Serialize};
use snippet_bundle::FileBlockScan;
use snippet_editor::{InspectIndex, LayoutRequest, StyleRequest, StyleState, TextRequest, WriteOutcome};
use snippet_linter::SecurityIssue;
use snippet_sourcemap::SourcePosition;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RequestPayload {
    ScanFileBlocks { source: String },
    ScanClassCandidates { source: String },
    ScanSecurity { source: String },
    BuildInspectIndex { source: String },
    ReadStyleState { source: String, position: SourcePosition },
    ApplyLayout { source: String, request: LayoutRequest },
    ApplyStyle { source: String, request: StyleRequest },
    ApplyText { source: String, request: TextRequest },
}

impl RequestPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            RequestPayload::ScanFileBlocks { .. } => "scanFileBlocks",
            RequestPayload::ScanClassCandidates { .. } => "scanClassCandidates",
            RequestPayload::ScanSecurity { .. } => "scanSecurity",
            RequestPayload::BuildInspectIndex { .. } => "buildInspectIndex",
            RequestPayload::ReadStyleState { .. } => "readStyleState",
            RequestPayload::ApplyLayout { .. } => "applyLayout",
            RequestPayload::ApplyStyle { .. } => "applyStyle",
            RequestPayload::ApplyText { .. } => "applyText",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ResponsePayload {
    FileBlocks(FileBlockScan),
    ClassCandidates(Vec<String>),
    Security(Vec<SecurityIssue>),
    InspectIndex(InspectIndex),
    StyleState(StyleState),
    Write(WriteOutcome),
}

impl ResponsePayload {
    pub fn kind(&self) -> &'static str {
        match self {
            ResponsePayload::FileBlocks(_) => "fileBlocks",
            ResponsePayload::ClassCandidates(_) => "classCandidates",
            ResponsePayload::Security(_) => "security",
            ResponsePayload::InspectIndex(_) => "inspectIndex",
            ResponsePayload::StyleState(_) => "styleState",
            ResponsePayload::Write(_) => "write",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRequest {
    pub id: u64,
    pub payload: RequestPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    pub id: u64,
    /// Failures cross the boundary as messages
    pub result: Result<ResponsePayload, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_json_shape() {
        let request = EngineRequest {
            id: 7,
            payload: RequestPayload::ScanSecurity {
                source: "eval(x)".to_string(),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["payload"]["type"], "scanSecurity");
        assert_eq!(json["payload"]["source"], "eval(x)");
    }

    #[test]
    fn test_error_response_json_shape() {
        let response = EngineResponse {
            id: 3,
            result: Err("boom".to_string()),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"id":3,"result":{"Err":"boom"}}"#);
        let back: EngineResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }
}
