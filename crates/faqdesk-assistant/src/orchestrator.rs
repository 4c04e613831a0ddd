use std::sync::Arc;

use serde::{Deserialize, Serialize};

use faqdesk_core::config::AssistantSettings;
use faqdesk_core::reservation::Reservation;
use faqdesk_core::types::SearchResult;
use faqdesk_retrieval::RetrievalEngine;

use crate::api::AssistantApi;
use crate::error::AssistantError;
use crate::poller::{PollPolicy, RunPoller};
use crate::prompt;

/// A reservation bound to its assistant thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub reservation_id: i64,
    pub thread_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    /// FAQ entries that were attached to the user's message.
    pub related: Vec<SearchResult>,
    /// Retrieval hit index/catalog faults while answering.
    pub degraded: bool,
}

/// Grounds each customer message in retrieved FAQ entries and relays it
/// to a hosted assistant.
pub struct Orchestrator<A: AssistantApi> {
    api: A,
    engine: Arc<RetrievalEngine>,
    policy: PollPolicy,
    history_messages: usize,
}

impl<A: AssistantApi> Orchestrator<A> {
    pub fn new(api: A, engine: Arc<RetrievalEngine>, settings: &AssistantSettings) -> Self {
        Self { api, engine, policy: PollPolicy::from(settings), history_messages: settings.history_messages }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Open a thread for `reservation` and seed it with the reservation context.
    pub fn start(&self, reservation: &Reservation) -> Result<Conversation, AssistantError> {
        let thread_id = self.api.create_thread()?;
        tracing::info!(reservation_id = reservation.reservation_id, thread_id = %thread_id, "created thread");
        let context = prompt::initial_context(reservation, self.history_messages);
        self.api.add_user_message(&thread_id, &context)?;
        tracing::info!(reservation_id = reservation.reservation_id, thread_id = %thread_id, "sent initial context");
        Ok(Conversation { reservation_id: reservation.reservation_id, thread_id })
    }

    pub fn reply(&self, conversation: &Conversation, reservation: &Reservation, message: &str) -> Result<Reply, AssistantError> {
        if message.trim().is_empty() {
            return Err(AssistantError::InvalidInput("message must not be empty".into()));
        }
        if conversation.reservation_id != reservation.reservation_id {
            return Err(AssistantError::InvalidInput(format!(
                "conversation belongs to reservation {}, not {}",
                conversation.reservation_id, reservation.reservation_id
            )));
        }

        let filters = reservation.metadata_filters();
        let retrieval = self.engine.retrieve_default(message, Some(&filters))?;
        let degraded = retrieval.is_degraded();
        if degraded {
            tracing::warn!(
                reservation_id = reservation.reservation_id,
                faults = retrieval.faults.len(),
                "retrieval degraded; answering with partial context"
            );
        }
        let related = retrieval.into_results();
        tracing::info!(reservation_id = reservation.reservation_id, related = related.len(), "retrieved faq context");

        let thread_id = &conversation.thread_id;
        self.api.add_user_message(thread_id, &prompt::combined_message(message, &related))?;
        let run_id = self.api.create_run(thread_id)?;
        RunPoller::new(&self.api, &self.policy).wait(thread_id, &run_id)?.into_result()?;

        let text = self
            .api
            .latest_reply(thread_id)?
            .ok_or_else(|| AssistantError::Protocol(format!("thread {thread_id} has no text reply")))?;
        Ok(Reply { text, related, degraded })
    }
}
