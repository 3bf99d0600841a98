use luna_core::context::MessageContext;
use serde::{Deserialize, Serialize};

/// Workflow state reported alongside every message exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Complete,
    AwaitingInput,
    Failed,
    #[default]
    #[serde(other)]
    Other,
}

impl WorkflowStatus {
    /// Whether a response in this state carries something worth relaying.
    pub fn is_replyable(self) -> bool {
        matches!(self, WorkflowStatus::Complete | WorkflowStatus::AwaitingInput)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
}

/// Decoded body of `POST /session/{id}/message` and `GET /session/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResponse {
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default)]
    pub messages: Vec<ResponseMessage>,
}

impl WorkflowResponse {
    pub fn last_assistant_message(&self) -> Option<&ResponseMessage> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    pub fn last_content(&self) -> Option<&str> {
        self.messages.last().and_then(|m| m.content.as_deref())
    }
}

/// Body of a successful `POST /session`.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Client-side record of the latest session started from a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    pub session_id: String,
    pub channel_id: String,
    pub status: Option<WorkflowStatus>,
    pub last_message: Option<String>,
}

/// Reply relationships of the inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseFlags {
    pub is_reply: bool,
    pub has_reply: bool,
    pub reply_to: Option<String>,
}

/// What a new session is seeded with: the message context, plus the reply
/// flags when the original message was available to inspect.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSeed {
    #[serde(flatten)]
    pub context: MessageContext,
    #[serde(flatten)]
    pub flags: Option<ResponseFlags>,
}

impl SessionSeed {
    pub fn new(context: MessageContext) -> Self {
        Self {
            context,
            flags: None,
        }
    }

    pub fn with_flags(mut self, flags: ResponseFlags) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn channel_id(&self) -> &str {
        self.context.channel_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_and_role_decode_as_other() {
        let resp: WorkflowResponse = serde_json::from_str(
            r#"{"status":"paused","messages":[{"role":"tool","content":null}]}"#,
        )
        .unwrap();
        assert_eq!(resp.status, WorkflowStatus::Other);
        assert_eq!(resp.messages[0].role, Role::Other);
        assert!(resp.messages[0].content.is_none());
    }

    #[test]
    fn missing_fields_default() {
        let resp: WorkflowResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.status, WorkflowStatus::Other);
        assert!(resp.messages.is_empty());
    }

    #[test]
    fn replyable_statuses() {
        assert!(WorkflowStatus::Complete.is_replyable());
        assert!(WorkflowStatus::AwaitingInput.is_replyable());
        assert!(!WorkflowStatus::Failed.is_replyable());
        assert!(!WorkflowStatus::Other.is_replyable());
    }

    #[test]
    fn last_assistant_message_skips_trailing_other_roles() {
        let resp: WorkflowResponse = serde_json::from_str(
            r#"{"status":"complete","messages":[
                {"role":"assistant","content":"hi"},
                {"role":"assistant","content":"bye"},
                {"role":"system","content":"done"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            resp.last_assistant_message().and_then(|m| m.content.as_deref()),
            Some("bye")
        );
        assert_eq!(resp.last_content(), Some("done"));
    }

    #[test]
    fn seed_flags_are_flattened_only_when_present() {
        let context: MessageContext = serde_json::from_value(serde_json::json!({
            "message": {"id": "1", "content": "x", "createdAt": "2024-01-01T00:00:00Z",
                        "reference": null, "attachments": []},
            "author": {"id": "2", "username": "u", "discriminator": null,
                       "globalName": null, "bot": false, "avatar": null},
            "member": null,
            "channel": {"id": "7", "name": null, "type": null, "topic": null,
                        "nsfw": null, "parentId": null},
            "guild": null,
            "thread": []
        }))
        .unwrap();

        let bare = serde_json::to_value(SessionSeed::new(context.clone())).unwrap();
        assert!(bare.get("is_reply").is_none());
        assert_eq!(bare["message"]["id"], "1");

        let flagged = serde_json::to_value(SessionSeed::new(context).with_flags(ResponseFlags {
            is_reply: true,
            has_reply: false,
            reply_to: Some("9".into()),
        }))
        .unwrap();
        assert_eq!(flagged["is_reply"], true);
        assert_eq!(flagged["has_reply"], false);
        assert_eq!(flagged["reply_to"], "9");
    }

    #[test]
    fn session_keeps_extra_fields() {
        let session: Session =
            serde_json::from_str(r#"{"session_id":"s-1","status":"created"}"#).unwrap();
        assert_eq!(session.session_id, "s-1");
        assert_eq!(session.extra["status"], "created");
    }
}
