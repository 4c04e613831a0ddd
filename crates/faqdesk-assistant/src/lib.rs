//! Conversation layer: binds reservations to hosted assistant threads and
//! grounds each customer message in retrieved FAQ entries.

pub mod api;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod poller;
pub mod prompt;

pub use api::{AssistantApi, RunStatus};
pub use error::AssistantError;
pub use openai::OpenAiAssistant;
pub use orchestrator::{Conversation, Orchestrator, Reply};
pub use poller::{PollPolicy, RunPoller, RunState};
pub use prompt::format_timestamp;
