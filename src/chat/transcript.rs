// Transcript of the active conversation
//
// Entries keep a delivery state next to the message. Everything renders the
// same way; the state is what lets the manager reconcile an optimistic entry
// with the backend's answer.

use crate::model::Message;

/// Where a transcript entry stands with respect to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Shown optimistically, backend has not answered yet
    Pending,
    /// Came from the backend, or the backend acknowledged it
    Confirmed,
    /// The backend rejected the send
    Failed,
    /// Never meant for the backend (demo replies, error notices)
    LocalOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub message: Message,
    pub delivery: Delivery,
}

/// Append-only message list (until replaced or cleared wholesale)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Messages in arrival order
    #[cfg(test)]
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|e| &e.message)
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    fn push(&mut self, message: Message, delivery: Delivery) {
        self.entries.push(TranscriptEntry { message, delivery });
    }

    /// Optimistic insert of a message that is on its way to the backend
    pub fn push_pending(&mut self, message: Message) {
        self.push(message, Delivery::Pending);
    }

    /// Append a message the backend produced
    pub fn push_confirmed(&mut self, message: Message) {
        self.push(message, Delivery::Confirmed);
    }

    /// Append a message that only exists on this side
    pub fn push_local(&mut self, message: Message) {
        self.push(message, Delivery::LocalOnly);
    }

    /// Move a pending entry to `delivery`. Returns false when the entry is
    /// gone (the transcript was replaced while the request was in flight).
    fn settle(&mut self, local_id: &str, delivery: Delivery) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|e| e.delivery == Delivery::Pending && e.message.id == local_id)
        {
            Some(entry) => {
                entry.delivery = delivery;
                true
            }
            None => false,
        }
    }

    /// Backend accepted the pending entry
    pub fn confirm(&mut self, local_id: &str) -> bool {
        self.settle(local_id, Delivery::Confirmed)
    }

    /// Backend rejected the pending entry
    pub fn fail(&mut self, local_id: &str) -> bool {
        self.settle(local_id, Delivery::Failed)
    }

    /// Pending entry will never reach a backend (demo mode)
    pub fn keep_local(&mut self, local_id: &str) -> bool {
        self.settle(local_id, Delivery::LocalOnly)
    }

    /// Swap in a loaded conversation; everything in it is confirmed
    pub fn replace(&mut self, messages: Vec<Message>) {
        self.entries = messages
            .into_iter()
            .map(|message| TranscriptEntry {
                message,
                delivery: Delivery::Confirmed,
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub fn count(&self, delivery: Delivery) -> usize {
        self.entries.iter().filter(|e| e.delivery == delivery).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgentMode, Role};

    fn msg(id: &str, role: Role) -> Message {
        Message::local(id.to_string(), role, format!("body of {}", id), AgentMode::General)
    }

    #[test]
    fn test_confirm_in_place_keeps_order() {
        let mut t = Transcript::new();
        t.push_confirmed(msg("a", Role::User));
        t.push_pending(msg("local-1", Role::User));

        assert!(t.confirm("local-1"));
        t.push_confirmed(msg("b", Role::Assistant));

        let ids: Vec<_> = t.messages().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "local-1", "b"]);
        assert_eq!(t.count(Delivery::Pending), 0);
        assert_eq!(t.count(Delivery::Confirmed), 3);
    }

    #[test]
    fn test_settle_only_touches_pending() {
        let mut t = Transcript::new();
        t.push_pending(msg("local-1", Role::User));
        assert!(t.fail("local-1"));
        // Already settled: a late confirmation is ignored
        assert!(!t.confirm("local-1"));
        assert_eq!(t.entries()[0].delivery, Delivery::Failed);
    }

    #[test]
    fn test_settle_after_replace_is_noop() {
        let mut t = Transcript::new();
        t.push_pending(msg("local-1", Role::User));
        t.replace(vec![msg("s1", Role::User), msg("s2", Role::Assistant)]);

        assert!(!t.confirm("local-1"));
        assert_eq!(t.len(), 2);
        assert!(t
            .entries()
            .iter()
            .all(|e| e.delivery == Delivery::Confirmed));
    }

    #[test]
    fn test_clear() {
        let mut t = Transcript::new();
        t.push_local(msg("x", Role::Assistant));
        assert!(!t.is_empty());
        t.clear();
        assert!(t.is_empty());
        assert!(t.last().is_none());
    }
}
