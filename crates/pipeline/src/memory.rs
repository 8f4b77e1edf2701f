//! Conversation memory (C5): per-session rolling transcript, capped at 50
//! entries.

use std::collections::HashMap;

use parking_lot::Mutex;

use scry_domain::conversation::ConversationEntry;
use scry_domain::trace::TraceEvent;

pub struct ConversationMemory {
    cap: usize,
    sessions: Mutex<HashMap<String, Vec<ConversationEntry>>>,
}

impl ConversationMemory {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn append(&self, session_id: &str, entry: ConversationEntry) {
        let mut sessions = self.sessions.lock();
        let entries = sessions.entry(session_id.to_string()).or_default();
        entries.push(entry);
        if entries.len() > self.cap {
            let excess = entries.len() - self.cap;
            entries.drain(0..excess);
        }
        TraceEvent::MemoryAppended {
            session_id: session_id.to_string(),
            entries: entries.len(),
        }
        .emit();
    }

    pub fn recent(&self, session_id: &str, n: usize) -> Vec<ConversationEntry> {
        let sessions = self.sessions.lock();
        match sessions.get(session_id) {
            Some(entries) => {
                let start = entries.len().saturating_sub(n);
                entries[start..].to_vec()
            }
            None => Vec::new(),
        }
    }

    pub fn clear(&self, session_id: &str) {
        self.sessions.lock().remove(session_id);
    }

    pub fn active_sessions(&self) -> Vec<String> {
        self.sessions.lock().keys().cloned().collect()
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_caps_at_fifty_entries() {
        let mem = ConversationMemory::new(50);
        for i in 0..60 {
            mem.append("s1", ConversationEntry::user(format!("msg {i}")));
        }
        assert_eq!(mem.recent("s1", 1000).len(), 50);
    }

    #[test]
    fn cap_drops_oldest_first() {
        let mem = ConversationMemory::new(50);
        for i in 0..55 {
            mem.append("s1", ConversationEntry::user(format!("msg {i}")));
        }
        let entries = mem.recent("s1", 1000);
        assert_eq!(entries.first().unwrap().content, "msg 5");
        assert_eq!(entries.last().unwrap().content, "msg 54");
    }

    #[test]
    fn recent_returns_last_n() {
        let mem = ConversationMemory::new(50);
        for i in 0..10 {
            mem.append("s1", ConversationEntry::user(format!("msg {i}")));
        }
        let entries = mem.recent("s1", 3);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].content, "msg 7");
    }

    #[test]
    fn sessions_are_independent() {
        let mem = ConversationMemory::new(50);
        mem.append("s1", ConversationEntry::user("hi"));
        mem.append("s2", ConversationEntry::user("yo"));
        assert_eq!(mem.recent("s1", 10).len(), 1);
        assert_eq!(mem.recent("s2", 10).len(), 1);
        assert_eq!(mem.active_sessions().len(), 2);
    }

    #[test]
    fn clear_removes_session() {
        let mem = ConversationMemory::new(50);
        mem.append("s1", ConversationEntry::user("hi"));
        mem.clear("s1");
        assert!(mem.recent("s1", 10).is_empty());
        assert!(mem.active_sessions().is_empty());
    }
}
