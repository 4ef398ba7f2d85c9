//! Process-wide transient session state.
//!
//! One `DashMap` holds both pending result sets (keyed by conversation) and
//! indicator handles (keyed by request). Every method is a single map
//! operation, so callers never compose a read and a write that could race.
//! Absence is always a normal outcome: the periodic flush may have evicted
//! the entry at any time.

use dashmap::DashMap;

use crate::types::{ConversationId, MessageRef, PendingResultSet, RequestId};

/// Key namespaces sharing the session table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Conversation(ConversationId),
    Request(RequestId),
}

/// Values stored in the session table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEntry {
    /// Images waiting for `/yes` in a conversation.
    Pending(PendingResultSet),
    /// The "Processing…" message of an in-flight request.
    Indicator(MessageRef),
}

/// Concurrent, lock-free session store shared by all event handlers.
#[derive(Debug, Default)]
pub struct SessionStore {
    entries: DashMap<SessionKey, SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Insert `entry`, returning whatever it replaced.
    pub fn put(&self, key: SessionKey, entry: SessionEntry) -> Option<SessionEntry> {
        self.entries.insert(key, entry)
    }

    /// Clone the entry under `key` without removing it.
    pub fn get(&self, key: &SessionKey) -> Option<SessionEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Atomically read and remove the entry under `key`.
    ///
    /// Of any number of concurrent `pop`s for the same key, at most one
    /// returns `Some`.
    pub fn pop(&self, key: &SessionKey) -> Option<SessionEntry> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    /// Remove every entry in every namespace. Returns how many were evicted.
    pub fn clear(&self) -> usize {
        let mut evicted = 0;
        self.entries.retain(|_, _| {
            evicted += 1;
            false
        });
        evicted
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // --- typed helpers -----------------------------------------------------

    /// Store the pending set for a conversation. Last write wins; returns
    /// `true` when an unconsumed set was discarded.
    pub fn put_pending(&self, conversation: ConversationId, set: PendingResultSet) -> bool {
        self.put(SessionKey::Conversation(conversation), SessionEntry::Pending(set))
            .is_some()
    }

    /// Consume the pending set for a conversation, if any.
    pub fn take_pending(&self, conversation: ConversationId) -> Option<PendingResultSet> {
        let key = SessionKey::Conversation(conversation);
        match self
            .entries
            .remove_if(&key, |_, v| matches!(v, SessionEntry::Pending(_)))
        {
            Some((_, SessionEntry::Pending(set))) => Some(set),
            _ => None,
        }
    }

    pub fn has_pending(&self, conversation: ConversationId) -> bool {
        matches!(
            self.get(&SessionKey::Conversation(conversation)),
            Some(SessionEntry::Pending(_))
        )
    }

    pub fn put_indicator(&self, request: RequestId, message: MessageRef) {
        self.put(SessionKey::Request(request), SessionEntry::Indicator(message));
    }

    /// Consume the indicator handle stored for a request, if any.
    pub fn take_indicator(&self, request: RequestId) -> Option<MessageRef> {
        let key = SessionKey::Request(request);
        match self
            .entries
            .remove_if(&key, |_, v| matches!(v, SessionEntry::Indicator(_)))
        {
            Some((_, SessionEntry::Indicator(msg))) => Some(msg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::ImageRef;

    fn set(n: usize) -> PendingResultSet {
        let images = (0..n)
            .map(|i| ImageRef::new(format!("https://img.example/{i}.gif")))
            .collect();
        PendingResultSet::new("log(25)", images)
    }

    fn msg(id: i32) -> MessageRef {
        MessageRef {
            conversation: ConversationId(7),
            message_id: id,
        }
    }

    #[test]
    fn pop_absent_key_is_none() {
        let store = SessionStore::new();
        assert!(store.pop(&SessionKey::Conversation(ConversationId(1))).is_none());
        assert!(store.take_pending(ConversationId(1)).is_none());
        assert!(store.take_indicator(RequestId::new()).is_none());
    }

    #[test]
    fn only_one_pop_per_put() {
        let store = SessionStore::new();
        let conv = ConversationId(42);
        store.put_pending(conv, set(2));
        assert_eq!(store.take_pending(conv).map(|s| s.len()), Some(2));
        assert!(store.take_pending(conv).is_none());

        store.put_pending(conv, set(1));
        assert!(store.take_pending(conv).is_some());
        assert!(store.take_pending(conv).is_none());
    }

    #[test]
    fn last_write_wins() {
        let store = SessionStore::new();
        let conv = ConversationId(1);
        assert!(!store.put_pending(conv, set(3)));
        assert!(store.put_pending(conv, set(1)));
        assert_eq!(store.size(), 1);
        assert_eq!(store.take_pending(conv).map(|s| s.len()), Some(1));
    }

    #[test]
    fn get_does_not_remove() {
        let store = SessionStore::new();
        let conv = ConversationId(5);
        store.put_pending(conv, set(1));
        assert!(store.get(&SessionKey::Conversation(conv)).is_some());
        assert!(store.has_pending(conv));
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn namespaces_do_not_collide() {
        let store = SessionStore::new();
        let req = RequestId::new();
        store.put_pending(ConversationId(7), set(1));
        store.put_indicator(req, msg(99));
        assert_eq!(store.size(), 2);
        assert_eq!(store.take_indicator(req), Some(msg(99)));
        assert!(store.has_pending(ConversationId(7)));
    }

    #[test]
    fn clear_empties_every_namespace() {
        let store = SessionStore::new();
        store.put_pending(ConversationId(1), set(1));
        store.put_pending(ConversationId(2), set(2));
        store.put_indicator(RequestId::new(), msg(3));
        assert_eq!(store.clear(), 3);
        assert_eq!(store.size(), 0);
        assert_eq!(store.clear(), 0);
    }

    #[test]
    fn racing_pops_have_one_winner() {
        let store = Arc::new(SessionStore::new());
        let conv = ConversationId(11);
        store.put_pending(conv, set(4));

        let winners: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = Arc::clone(&store);
                    s.spawn(move || store.take_pending(conv).is_some() as usize)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(winners, 1);
    }

    #[test]
    fn clear_after_concurrent_puts_leaves_nothing() {
        let store = Arc::new(SessionStore::new());
        std::thread::scope(|s| {
            for t in 0..4 {
                let store = Arc::clone(&store);
                s.spawn(move || {
                    for i in 0..100 {
                        store.put_pending(ConversationId(t * 1000 + i), set(1));
                    }
                });
            }
        });
        assert_eq!(store.clear(), 400);
        assert_eq!(store.size(), 0);
    }
}
