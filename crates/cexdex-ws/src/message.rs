//! Stream control messages and the events forwarded downstream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Live-subscribe request for one or more streams.
///
/// Wire form: `{"method":"SUBSCRIBE","params":["btcusdc@trade"],"id":1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub method: String,
    pub params: Vec<String>,
    pub id: u64,
}

impl SubscribeRequest {
    pub fn subscribe(streams: &[String], id: u64) -> Self {
        Self {
            method: "SUBSCRIBE".to_string(),
            params: streams.to_vec(),
            id,
        }
    }
}

/// Reply to a control request.
///
/// Success is `{"result":null,"id":1}`. Failures carry either a nested
/// `error` object or top-level `code`/`msg` fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ControlResponse {
    pub id: u64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ControlError>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ControlError {
    pub code: i64,
    pub msg: String,
}

impl ControlResponse {
    /// Parse `text` as a control reply.
    ///
    /// Data frames also arrive as JSON objects, so anything carrying an
    /// event type (`e`) or lacking an `id` is treated as data.
    pub fn try_parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        let obj = value.as_object()?;
        if obj.contains_key("e") || !obj.contains_key("id") {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.code.is_some()
    }

    /// Human-readable failure description, if this reply is an error.
    pub fn error_message(&self) -> Option<String> {
        if let Some(err) = &self.error {
            return Some(format!("code={} msg={}", err.code, err.msg));
        }
        self.code.map(|code| {
            format!(
                "code={} msg={}",
                code,
                self.msg.as_deref().unwrap_or_default()
            )
        })
    }
}

/// Event forwarded to the consumer of a [`crate::ConnectionManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsEvent {
    /// Socket open and subscribe request sent.
    Connected,
    /// Data frame, unparsed.
    Text(String),
    /// Socket ended. Sent exactly once per connection.
    Closed { code: u16, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_wire_format() {
        let req = SubscribeRequest::subscribe(&["btcusdc@trade".to_string()], 1);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(
            json,
            r#"{"method":"SUBSCRIBE","params":["btcusdc@trade"],"id":1}"#
        );
    }

    #[test]
    fn test_ack_is_control_response() {
        let resp = ControlResponse::try_parse(r#"{"result":null,"id":1}"#).unwrap();
        assert_eq!(resp.id, 1);
        assert!(!resp.is_error());
        assert!(resp.error_message().is_none());
    }

    #[test]
    fn test_error_forms() {
        let nested =
            ControlResponse::try_parse(r#"{"error":{"code":2,"msg":"Invalid request"},"id":3}"#)
                .unwrap();
        assert!(nested.is_error());
        assert_eq!(
            nested.error_message().as_deref(),
            Some("code=2 msg=Invalid request")
        );

        let flat = ControlResponse::try_parse(r#"{"code":1,"msg":"bad","id":4}"#).unwrap();
        assert!(flat.is_error());
    }

    #[test]
    fn test_trade_is_not_control_response() {
        let trade = r#"{"e":"trade","E":1,"s":"BTCUSDC","t":7,"p":"100.00","q":"1","T":1,"m":true,"M":true}"#;
        assert!(ControlResponse::try_parse(trade).is_none());
        assert!(ControlResponse::try_parse("not json").is_none());
        assert!(ControlResponse::try_parse("[1,2]").is_none());
    }
}
