//! Request/response shapes at the boundary of the core
//!
//! The transport listener is an external collaborator; it hands the core an
//! `InboundRequest` and expects a `Response` back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};

/// One change notification as received from the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundRequest {
    /// Route path the notification arrived on (e.g. "/prod2525")
    pub route: String,

    /// Raw transport method (e.g. "POST")
    pub method: String,

    /// Address of the calling client
    pub client_address: String,

    /// Trigger payload, already decoded to JSON by the transport
    #[serde(default)]
    pub payload: Value,
}

impl InboundRequest {
    pub fn new(
        route: impl Into<String>,
        method: impl Into<String>,
        client_address: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            route: route.into(),
            method: method.into(),
            client_address: client_address.into(),
            payload,
        }
    }

    /// Convenience constructor for a POSTed notification
    pub fn post(route: impl Into<String>, client_address: impl Into<String>, payload: Value) -> Self {
        Self::new(route, "POST", client_address, payload)
    }
}

/// Parsed trigger notification: which record of which project changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerPayload {
    pub project_id: String,
    pub record_id: String,

    /// Everything else the trigger carried (instrument, event name, ...)
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl TriggerPayload {
    /// Parse a trigger payload
    ///
    /// Returns `Ok(None)` when the payload carries no data at all (e.g. the
    /// "test URL" ping some record systems send).
    pub fn parse(payload: &Value) -> CoreResult<Option<Self>> {
        let object = match payload {
            Value::Null => return Ok(None),
            Value::Object(map) if map.is_empty() => return Ok(None),
            Value::Object(map) => map,
            Value::Array(_) => return Err(CoreError::InvalidTrigger("array".to_string())),
            _ => return Err(CoreError::InvalidTrigger("scalar".to_string())),
        };

        let project_id = text_field(object, "project_id")
            .ok_or(CoreError::MissingField("project_id"))?;
        let record_id = text_field(object, "record").ok_or(CoreError::MissingField("record"))?;

        let extra = object
            .iter()
            .filter(|(k, _)| k.as_str() != "project_id" && k.as_str() != "record")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Some(Self {
            project_id,
            record_id,
            extra,
        }))
    }
}

fn text_field(object: &Map<String, Value>, name: &str) -> Option<String> {
    let text = match object.get(name)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Response returned to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
}

impl Response {
    pub const OK: Response = Response { status: 200 };
    pub const BAD_REQUEST: Response = Response { status: 400 };
    pub const FORBIDDEN: Response = Response { status: 403 };
    pub const NOT_FOUND: Response = Response { status: 404 };
    pub const METHOD_NOT_ALLOWED: Response = Response { status: 405 };
    pub const INTERNAL_ERROR: Response = Response { status: 500 };

    pub fn with_status(status: u16) -> Self {
        Self { status }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl Default for Response {
    fn default() -> Self {
        Response::OK
    }
}
