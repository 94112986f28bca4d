use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    rooms_created: AtomicU64,
    rooms_deleted: AtomicU64,
    messages_sent: AtomicU64,
    messages_rejected: AtomicU64,
    deliveries: AtomicU64,
    feeds_opened: AtomicU64,
    feeds_closed: AtomicU64,
    feeds_lagged: AtomicU64,
}

impl Metrics {
    pub fn record_room_created(&self) {
        self.rooms_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_room_deleted(&self) {
        self.rooms_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message(&self, delivered: usize) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(delivered as u64, Ordering::Relaxed);
    }

    pub fn record_message_rejected(&self) {
        self.messages_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_feed_opened(&self) {
        self.feeds_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_feed_closed(&self) {
        self.feeds_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_feed_lagged(&self) {
        self.feeds_lagged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn open_feeds(&self) -> u64 {
        let opened = self.feeds_opened.load(Ordering::Relaxed);
        let closed = self.feeds_closed.load(Ordering::Relaxed);
        opened.saturating_sub(closed)
    }

    pub fn render_prometheus(&self) -> String {
        let rooms_created = self.rooms_created.load(Ordering::Relaxed);
        let rooms_deleted = self.rooms_deleted.load(Ordering::Relaxed);
        let sent = self.messages_sent.load(Ordering::Relaxed);
        let rejected = self.messages_rejected.load(Ordering::Relaxed);
        let deliveries = self.deliveries.load(Ordering::Relaxed);
        let lagged = self.feeds_lagged.load(Ordering::Relaxed);

        format!(
            "# TYPE chat_rooms_created_total counter\n\
chat_rooms_created_total {}\n\
# TYPE chat_rooms_deleted_total counter\n\
chat_rooms_deleted_total {}\n\
# TYPE chat_messages_sent_total counter\n\
chat_messages_sent_total {}\n\
# TYPE chat_messages_rejected_total counter\n\
chat_messages_rejected_total {}\n\
# TYPE chat_feed_deliveries_total counter\n\
chat_feed_deliveries_total {}\n\
# TYPE chat_feeds_lagged_total counter\n\
chat_feeds_lagged_total {}\n\
# TYPE chat_feeds_open gauge\n\
chat_feeds_open {}\n",
            rooms_created,
            rooms_deleted,
            sent,
            rejected,
            deliveries,
            lagged,
            self.open_feeds()
        )
    }
}
