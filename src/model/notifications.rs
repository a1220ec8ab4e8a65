use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NotificationId(u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "n{}", self.0) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub text: String,
    #[serde(skip)]
    pub ttl: Duration,
}

/// Oldest-first queue. Expiry timers are owned by whoever drives the queue;
/// this only tracks what is currently shown.
#[derive(Clone, Debug)]
pub struct NotificationQueue {
    items: VecDeque<Notification>,
    capacity: usize,
    default_ttl: Duration,
    next_id: u64,
}

impl NotificationQueue {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            capacity: capacity.max(1),
            default_ttl,
            next_id: 0,
        }
    }

    /// Appends a notification. When the queue is full the oldest one is
    /// evicted and returned so its timer can be dropped.
    pub fn push(
        &mut self,
        kind: NotificationKind,
        text: impl Into<String>,
        ttl: Option<Duration>,
    ) -> (Notification, Option<NotificationId>) {
        let id = NotificationId(self.next_id);
        self.next_id += 1;
        let notification = Notification {
            id,
            kind,
            text: text.into(),
            ttl: ttl.unwrap_or(self.default_ttl),
        };
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front().map(|n| n.id)
        } else {
            None
        };
        self.items.push_back(notification.clone());
        (notification, evicted)
    }

    /// Removes `id`. Returns false for ids already gone.
    pub fn expire(&mut self, id: NotificationId) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) -> Vec<NotificationId> { self.items.drain(..).map(|n| n.id).collect() }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> { self.items.iter() }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}
