//! Per-session conversation state.

use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;

use crate::messaging::EndUserMessage;

/// Bounded per-session history of user turns, feeding the router's planner.
///
/// Sessions are created on first touch and cleared when a conversation
/// completes.
pub struct SessionStateManager {
    history_limit: usize,
    history: RwLock<HashMap<String, VecDeque<EndUserMessage>>>,
}

impl SessionStateManager {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history_limit,
            history: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_to_history(&self, session: &str, message: EndUserMessage) {
        let mut history = self.history.write();
        let entries = history.entry(session.to_string()).or_default();
        if entries.len() == self.history_limit {
            entries.pop_front();
        }
        entries.push_back(message);
    }

    pub fn history(&self, session: &str) -> Vec<EndUserMessage> {
        self.history
            .read()
            .get(session)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear_session(&self, session: &str) {
        self.history.write().remove(session);
    }

    pub fn session_count(&self) -> usize {
        self.history.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_per_session() {
        let manager = SessionStateManager::new(10);
        manager.add_to_history("a", EndUserMessage::new("first", "user"));
        manager.add_to_history("b", EndUserMessage::new("other", "user"));

        assert_eq!(manager.history("a").len(), 1);
        assert_eq!(manager.history("b").len(), 1);
        assert_eq!(manager.history("a")[0].content, "first");
    }

    #[test]
    fn test_history_limit_evicts_oldest() {
        let manager = SessionStateManager::new(2);
        for content in ["one", "two", "three"] {
            manager.add_to_history("a", EndUserMessage::new(content, "user"));
        }

        let history = manager.history("a");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "two");
        assert_eq!(history[1].content, "three");
    }

    #[test]
    fn test_clear_session() {
        let manager = SessionStateManager::new(10);
        manager.add_to_history("a", EndUserMessage::new("first", "user"));
        manager.clear_session("a");
        assert!(manager.history("a").is_empty());
        assert_eq!(manager.session_count(), 0);
    }
}
