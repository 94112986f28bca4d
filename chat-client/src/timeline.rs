use backend_domain::ChatMessage;

/// Outcome of offering one live message to the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    Appended,
    Duplicate,
    /// Messages between `expected` and the offered seq are missing.
    Gap { expected: u64, got: u64 },
}

/// Ordered, duplicate-free view of one room's messages keyed by `seq`.
#[derive(Debug, Default, Clone)]
pub struct Timeline {
    messages: Vec<ChatMessage>,
    last_seq: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn replace(&mut self, snapshot: Vec<ChatMessage>) {
        self.last_seq = snapshot.last().map(|message| message.seq).unwrap_or(0);
        self.messages = snapshot;
    }

    /// Appends `message` only when it directly follows the last known seq.
    pub fn accept(&mut self, message: ChatMessage) -> Accepted {
        if message.seq <= self.last_seq {
            return Accepted::Duplicate;
        }
        let expected = self.last_seq + 1;
        if message.seq != expected {
            return Accepted::Gap {
                expected,
                got: message.seq,
            };
        }
        self.last_seq = message.seq;
        self.messages.push(message);
        Accepted::Appended
    }

    /// Appends every snapshot entry newer than the last known seq and returns them.
    pub fn merge(&mut self, snapshot: Vec<ChatMessage>) -> Vec<ChatMessage> {
        let mut added = Vec::new();
        for message in snapshot {
            if message.seq > self.last_seq {
                self.last_seq = message.seq;
                self.messages.push(message.clone());
                added.push(message);
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_domain::RoomId;
    use chrono::Utc;

    fn message(seq: u64) -> ChatMessage {
        ChatMessage {
            room_id: RoomId(1),
            seq,
            sender: "alice".to_string(),
            message: format!("m{seq}"),
            timestamp: Utc::now(),
        }
    }

    fn seqs(timeline: &Timeline) -> Vec<u64> {
        timeline.messages().iter().map(|m| m.seq).collect()
    }

    #[test]
    fn appends_in_order_and_drops_duplicates() {
        let mut timeline = Timeline::new();
        timeline.replace(vec![message(1), message(2)]);

        assert_eq!(timeline.accept(message(3)), Accepted::Appended);
        assert_eq!(timeline.accept(message(3)), Accepted::Duplicate);
        assert_eq!(timeline.accept(message(2)), Accepted::Duplicate);
        assert_eq!(seqs(&timeline), vec![1, 2, 3]);
    }

    #[test]
    fn gap_is_reported_without_appending() {
        let mut timeline = Timeline::new();
        timeline.replace(vec![message(1)]);

        assert_eq!(
            timeline.accept(message(4)),
            Accepted::Gap { expected: 2, got: 4 }
        );
        assert_eq!(timeline.last_seq(), 1);

        let added = timeline.merge(vec![message(1), message(2), message(3), message(4)]);
        assert_eq!(added.iter().map(|m| m.seq).collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(seqs(&timeline), vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_snapshot_starts_at_one() {
        let mut timeline = Timeline::new();
        timeline.replace(Vec::new());
        assert!(timeline.is_empty());
        assert_eq!(timeline.accept(message(1)), Accepted::Appended);
    }

    #[test]
    fn evicted_prefix_still_merges() {
        let mut timeline = Timeline::new();
        timeline.replace(vec![message(7), message(8)]);
        assert_eq!(timeline.accept(message(9)), Accepted::Appended);
        assert!(timeline.merge(vec![message(8), message(9)]).is_empty());
        assert_eq!(timeline.len(), 3);
    }
}
