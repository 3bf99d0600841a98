use std::time::Duration;

use dashmap::DashMap;
use luna_core::config::LunaConfig;
use luna_core::context::MessageContext;
use luna_core::source::{ChatMessage, MessageSource};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, WorkflowError};
use crate::types::{ResponseFlags, Session, SessionData, SessionSeed, WorkflowResponse};

/// The chat message a request originated from, plus where to read its
/// channel history. Lets the client work out the reply flags itself.
#[derive(Clone, Copy)]
pub struct OriginMessage<'a> {
    pub message: &'a ChatMessage,
    pub source: &'a dyn MessageSource,
}

pub struct WorkflowClient {
    client: reqwest::Client,
    api_url: String,
    workflow_id: String,
    history_limit: u8,
    /// Latest session per channel id.
    sessions: DashMap<String, SessionData>,
}

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    workflow_id: &'a str,
    initial_data: InitialData<'a>,
}

#[derive(Serialize)]
struct InitialData<'a> {
    #[serde(flatten)]
    seed: &'a SessionSeed,
    channel_id: &'a str,
    root: &'a str,
    /// Filled in server-side.
    session_id: Option<&'a str>,
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_type: Option<&'a str>,
}

impl WorkflowClient {
    pub fn new(config: &LunaConfig, history_limit: u8) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            workflow_id: config.workflow_id.clone(),
            history_limit,
            sessions: DashMap::new(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Work out whether `message` is a reply and whether anything recent
    /// replies to it.
    ///
    /// Only the `history_limit` most recent messages of the channel are
    /// scanned. Never fails: if the history can't be read all flags fall
    /// back to their defaults.
    pub async fn check_message_responses(
        &self,
        source: &dyn MessageSource,
        message: &ChatMessage,
    ) -> ResponseFlags {
        let reply_to = message.replied_message_id();

        let recent = match source.recent(message.channel_id, self.history_limit).await {
            Ok(recent) => recent,
            Err(e) => {
                warn!(
                    channel_id = message.channel_id,
                    message_id = message.id,
                    error = %e,
                    "error checking message responses"
                );
                return ResponseFlags::default();
            }
        };

        ResponseFlags {
            is_reply: reply_to.is_some(),
            has_reply: recent.iter().any(|m| m.is_reply_to(message.id)),
            reply_to: reply_to.map(|id| id.to_string()),
        }
    }

    /// Start a new session on the configured workflow, seeded with `seed`.
    ///
    /// The session is remembered as the latest one for its channel.
    pub async fn create_session(&self, seed: &SessionSeed) -> Result<Session> {
        let url = format!("{}/session", self.api_url);
        let body = CreateSessionRequest {
            workflow_id: &self.workflow_id,
            initial_data: InitialData {
                seed,
                channel_id: seed.channel_id(),
                root: &self.workflow_id,
                session_id: None,
            },
        };

        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().to_string();
            warn!(%status, workflow = %self.workflow_id, "session creation rejected");
            return Err(WorkflowError::SessionCreation { status });
        }

        let session: Session = resp
            .json()
            .await
            .map_err(|e| WorkflowError::Parse(e.to_string()))?;

        debug!(session_id = %session.session_id, channel_id = %seed.channel_id(), "session created");
        self.sessions.insert(
            seed.channel_id().to_string(),
            SessionData {
                session_id: session.session_id.clone(),
                channel_id: seed.channel_id().to_string(),
                status: None,
                last_message: None,
            },
        );
        Ok(session)
    }

    /// Relay one chat message: new session, system marker, then the text.
    ///
    /// The marker body `session_id:<id>` is how workflow steps learn their
    /// own session id, so it must be posted before the user's text.
    pub async fn send_message(
        &self,
        text: &str,
        context: MessageContext,
        origin: Option<OriginMessage<'_>>,
    ) -> Result<WorkflowResponse> {
        let mut seed = SessionSeed::new(context);
        if let Some(origin) = origin {
            let flags = self
                .check_message_responses(origin.source, origin.message)
                .await;
            seed = seed.with_flags(flags);
        }

        let session = self.create_session(&seed).await?;
        let session_id = session.session_id.as_str();

        let marker = format!("session_id:{session_id}");
        let resp = self
            .post_message(
                session_id,
                &PostMessageRequest {
                    message: &marker,
                    message_type: Some("system"),
                },
            )
            .await?;
        if !resp.status().is_success() {
            warn!(%session_id, status = %resp.status(), "system marker rejected, continuing");
        }

        let resp = self
            .post_message(
                session_id,
                &PostMessageRequest {
                    message: text,
                    message_type: None,
                },
            )
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().to_string();
            warn!(%session_id, %status, "message rejected");
            return Err(WorkflowError::MessageSend { status });
        }

        let response: WorkflowResponse = resp
            .json()
            .await
            .map_err(|e| WorkflowError::Parse(e.to_string()))?;

        info!(
            %session_id,
            status = ?response.status,
            messages = response.messages.len(),
            "workflow responded"
        );
        Ok(response)
    }

    /// Fetch the server-side state of the latest session started from
    /// `channel_id` and refresh the cached status and last message.
    pub async fn get_session_state(&self, channel_id: &str) -> Result<WorkflowResponse> {
        let session_id = self
            .sessions
            .get(channel_id)
            .map(|s| s.session_id.clone())
            .ok_or_else(|| WorkflowError::NoActiveSession {
                channel_id: channel_id.to_string(),
            })?;

        let url = format!("{}/session/{}", self.api_url, session_id);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().to_string();
            warn!(%session_id, %status, "session state request rejected");
            return Err(WorkflowError::SessionState { status });
        }

        let state: WorkflowResponse = resp
            .json()
            .await
            .map_err(|e| WorkflowError::Parse(e.to_string()))?;

        if let Some(mut cached) = self.sessions.get_mut(channel_id) {
            cached.status = Some(state.status);
            cached.last_message = state.last_content().map(str::to_string);
        }
        Ok(state)
    }

    /// Snapshot of the cached session for a channel.
    pub fn cached_session(&self, channel_id: &str) -> Option<SessionData> {
        self.sessions.get(channel_id).map(|s| s.value().clone())
    }

    async fn post_message(
        &self,
        session_id: &str,
        body: &PostMessageRequest<'_>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/session/{}/message", self.api_url, session_id);
        Ok(self.client.post(&url).json(body).send().await?)
    }
}
