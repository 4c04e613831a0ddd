//! Blocking client for the hosted Assistants (v2) HTTP API.

use std::time::Duration;

use serde_json::{json, Value};

use faqdesk_core::config::AssistantSettings;

use crate::api::{AssistantApi, RunStatus};
use crate::error::AssistantError;

pub struct OpenAiAssistant {
    agent: ureq::Agent,
    api_base: String,
    api_key: String,
    assistant_id: String,
}

impl OpenAiAssistant {
    pub fn new(api_base: &str, api_key: &str, assistant_id: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            assistant_id: assistant_id.to_string(),
        }
    }

    /// Credentials come from `OPENAI_API_KEY`; the assistant id from the
    /// settings or else `OPENAI_ASSISTANT_ID`.
    pub fn from_settings(settings: &AssistantSettings) -> Result<Self, AssistantError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AssistantError::InvalidConfig("OPENAI_API_KEY is not set".into()))?;
        let assistant_id = settings
            .assistant_id
            .clone()
            .or_else(|| std::env::var("OPENAI_ASSISTANT_ID").ok())
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                AssistantError::InvalidConfig("assistant.assistant_id or OPENAI_ASSISTANT_ID must be set".into())
            })?;
        Ok(Self::new(&settings.api_base, &api_key, &assistant_id, Duration::from_secs(settings.timeout_secs)))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    fn post(&self, path: &str, body: Value) -> Result<Value, AssistantError> {
        let response = self
            .agent
            .post(&self.url(path))
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("OpenAI-Beta", "assistants=v2")
            .send_json(body)
            .map_err(|e| http_error(path, e))?;
        response.into_json().map_err(|e| AssistantError::Protocol(format!("{path}: {e}")))
    }

    fn get(&self, path: &str) -> Result<Value, AssistantError> {
        let response = self
            .agent
            .get(&self.url(path))
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("OpenAI-Beta", "assistants=v2")
            .call()
            .map_err(|e| http_error(path, e))?;
        response.into_json().map_err(|e| AssistantError::Protocol(format!("{path}: {e}")))
    }
}

impl AssistantApi for OpenAiAssistant {
    fn create_thread(&self) -> Result<String, AssistantError> {
        let body = self.post("threads", json!({}))?;
        parse_id(&body)
    }

    fn add_user_message(&self, thread_id: &str, content: &str) -> Result<(), AssistantError> {
        self.post(&format!("threads/{thread_id}/messages"), json!({ "role": "user", "content": content }))?;
        Ok(())
    }

    fn create_run(&self, thread_id: &str) -> Result<String, AssistantError> {
        let body = self.post(&format!("threads/{thread_id}/runs"), json!({ "assistant_id": self.assistant_id }))?;
        parse_id(&body)
    }

    fn run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, AssistantError> {
        let body = self.get(&format!("threads/{thread_id}/runs/{run_id}"))?;
        parse_status(&body)
    }

    fn latest_reply(&self, thread_id: &str) -> Result<Option<String>, AssistantError> {
        let body = self.get(&format!("threads/{thread_id}/messages?order=desc&limit=1"))?;
        parse_latest_text(&body)
    }
}

fn http_error(path: &str, err: ureq::Error) -> AssistantError {
    match err {
        ureq::Error::Status(code, response) => {
            let detail = response.into_string().unwrap_or_default();
            AssistantError::Http(format!("{path}: status {code}: {detail}"))
        }
        other => AssistantError::Http(format!("{path}: {other}")),
    }
}

pub fn parse_id(body: &Value) -> Result<String, AssistantError> {
    body["id"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| AssistantError::Protocol("response has no 'id'".into()))
}

pub fn parse_status(body: &Value) -> Result<RunStatus, AssistantError> {
    body["status"]
        .as_str()
        .map(RunStatus::parse)
        .ok_or_else(|| AssistantError::Protocol("run has no 'status'".into()))
}

/// Text of the first message in a message list, joined across its text parts.
///
/// `Ok(None)` when the thread is empty or the message carries no text.
pub fn parse_latest_text(body: &Value) -> Result<Option<String>, AssistantError> {
    let data = body["data"]
        .as_array()
        .ok_or_else(|| AssistantError::Protocol("message list has no 'data'".into()))?;
    let Some(message) = data.first() else {
        return Ok(None);
    };
    let parts: Vec<&str> = message["content"]
        .as_array()
        .map(|content| {
            content
                .iter()
                .filter(|part| part["type"] == "text")
                .filter_map(|part| part["text"]["value"].as_str())
                .collect()
        })
        .unwrap_or_default();
    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parts.join("\n")))
    }
}
