use thiserror::Error;

use faqdesk_retrieval::RetrievalError;

use crate::api::RunStatus;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected response: {0}")]
    Protocol(String),

    #[error("Run ended with status '{0}'")]
    RunFailed(RunStatus),

    #[error("Run did not finish after {attempts} polls")]
    TimedOut { attempts: u32 },

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}
