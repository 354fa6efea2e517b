//! Conversation with the study-abroad assistant.
//!
//! The transcript is what the user sees. Only completed exchanges go into
//! the history sent with the next question, so a failed turn is never
//! replayed to the model.

use crate::service::model::ChatMessage;
use crate::service::Generation;
use crate::{Error, Result};

pub const ASSISTANT_GREETING: &str = "Hi! I'm Guido, your assistant for studying in Italy. \
Ask me about visas, housing, city life or anything else on your mind.";
pub const ASSISTANT_FAILURE_REPLY: &str = "Sorry, something went wrong. Please try again.";

#[derive(Debug, Clone)]
pub struct Conversation {
    transcript: Vec<ChatMessage>,
    history: Vec<ChatMessage>,
    pending: Option<String>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            transcript: vec![ChatMessage::model(ASSISTANT_GREETING)],
            history: Vec::new(),
            pending: None,
        }
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Exchanges the model has answered, oldest first
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Records a question and returns it trimmed. One question at a time.
    pub fn ask(&mut self, text: &str) -> Result<String> {
        let question = text.trim();
        if question.is_empty() {
            return Err(Error::InvalidRequest("empty question".into()));
        }
        if self.pending.is_some() {
            return Err(Error::InvalidRequest("still waiting for the previous answer".into()));
        }
        self.transcript.push(ChatMessage::user(question));
        self.pending = Some(question.to_string());
        Ok(question.to_string())
    }

    /// Commits the answer to the pending question
    pub fn receive(&mut self, result: Result<Generation>) {
        let Some(question) = self.pending.take() else {
            log::debug!("assistant reply arrived with no question pending");
            return;
        };
        match result {
            Ok(generation) => {
                let reply = generation.text.trim().to_string();
                self.history.push(ChatMessage::user(question));
                self.history.push(ChatMessage::model(reply.clone()));
                self.transcript.push(ChatMessage::model(reply));
            }
            Err(err) => {
                log::warn!("assistant failed: {err}");
                self.transcript.push(ChatMessage::model(ASSISTANT_FAILURE_REPLY));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ChatRole;

    #[test]
    fn test_exchange_goes_into_history() {
        let mut chat = Conversation::new();
        assert_eq!(chat.transcript().len(), 1);

        assert_eq!(chat.ask("  Do I need a visa? ").unwrap(), "Do I need a visa?");
        assert!(chat.is_waiting());
        assert!(chat.ask("And housing?").is_err());

        chat.receive(Ok(Generation::new("Yes, a type D visa.\n")));
        assert!(!chat.is_waiting());
        assert_eq!(
            chat.history(),
            &[ChatMessage::user("Do I need a visa?"), ChatMessage::model("Yes, a type D visa.")]
        );
        assert_eq!(chat.transcript().len(), 3);
    }

    #[test]
    fn test_failed_turn_stays_out_of_history() {
        let mut chat = Conversation::new();
        assert!(chat.ask("   ").is_err());

        chat.ask("Hello?").unwrap();
        chat.receive(Err(Error::Service {
            status: 500,
            message: "boom".into(),
        }));

        assert!(chat.history().is_empty());
        let last = chat.transcript().last().unwrap();
        assert_eq!(last.role, ChatRole::Model);
        assert_eq!(last.text, ASSISTANT_FAILURE_REPLY);
        assert!(chat.ask("Hello again").is_ok());
    }
}
