use riverboat_gameroom::Fault;
use serde::Deserialize;
use serde::Serialize;

/// The wire envelope: every frame in either direction is one of these.
///
/// Requests carry `type`, optional `request_id`, and `data`. Every reply
/// echoes the `request_id` (when one was given) and carries `success`;
/// failures add `error` as `"[CODE] message"`. Server-initiated broadcasts
/// never carry a `request_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Envelope {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// A successful reply, echoing the request id.
    pub fn reply(kind: &str, request_id: Option<String>, data: serde_json::Value) -> Self {
        Self {
            kind: kind.to_string(),
            request_id,
            data,
            success: Some(true),
            error: None,
            timestamp: None,
        }
    }

    /// A failed reply, echoing the request id.
    pub fn failure(kind: &str, request_id: Option<String>, fault: &Fault) -> Self {
        Self {
            kind: kind.to_string(),
            request_id,
            data: serde_json::Value::Null,
            success: Some(false),
            error: Some(fault.wire()),
            timestamp: None,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize envelope")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_request() {
        let envelope = Envelope::parse(
            r#"{"type":"table_join","request_id":"r-7","data":{"table_id":"x"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.kind, "table_join");
        assert_eq!(envelope.request_id.as_deref(), Some("r-7"));
        assert_eq!(envelope.data["table_id"], "x");
        assert!(envelope.success.is_none());
    }

    #[test]
    fn reply_echoes_request_id() {
        let reply = Envelope::reply("ping", Some("r-1".into()), serde_json::Value::Null);
        let value: serde_json::Value = serde_json::from_str(&reply.to_json()).unwrap();
        assert_eq!(value["request_id"], "r-1");
        assert_eq!(value["success"], true);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn failure_carries_bracketed_code() {
        let fault = Fault::table_not_found();
        let reply = Envelope::failure("table_join", Some("r-2".into()), &fault);
        let value: serde_json::Value = serde_json::from_str(&reply.to_json()).unwrap();
        assert_eq!(value["success"], false);
        assert!(
            value["error"]
                .as_str()
                .unwrap()
                .starts_with("[TABLE_NOT_FOUND]")
        );
    }

    #[test]
    fn roundtrip() {
        let reply = Envelope::reply("table_list", None, serde_json::json!({"tables": []}));
        let parsed = Envelope::parse(&reply.to_json()).unwrap();
        assert_eq!(parsed.kind, "table_list");
        assert_eq!(parsed.success, Some(true));
    }
}
