use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a notification stays visible after it was pushed.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

pub type NotificationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub text: String,
    pub severity: Severity,
    pub created_at: Instant,
}

impl Notification {
    pub fn expires_at(&self, ttl: Duration) -> Instant {
        self.created_at + ttl
    }
}

/// FIFO of transient messages. Every entry expires on its own clock.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    entries: VecDeque<Notification>,
    ttl: Duration,
    next_id: NotificationId,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(NOTIFICATION_TTL)
    }
}

impl NotificationQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            ttl,
            next_id: 1,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn push(&mut self, text: impl Into<String>, severity: Severity) -> &Notification {
        self.push_at(text, severity, Instant::now())
    }

    pub fn push_at(
        &mut self,
        text: impl Into<String>,
        severity: Severity,
        now: Instant,
    ) -> &Notification {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_back(Notification {
            id,
            text: text.into(),
            severity,
            created_at: now,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Entries still visible at `now`, oldest first.
    pub fn active(&self, now: Instant) -> impl Iterator<Item = &Notification> + '_ {
        let ttl = self.ttl;
        self.entries
            .iter()
            .filter(move |entry| entry.expires_at(ttl) > now)
    }

    /// Removes and returns every entry that has expired at `now`.
    pub fn prune(&mut self, now: Instant) -> Vec<Notification> {
        let ttl = self.ttl;
        let mut expired = Vec::new();
        self.entries.retain(|entry| {
            if entry.expires_at(ttl) <= now {
                expired.push(entry.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Removes an entry before it expires. Returns whether it was present.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Earliest instant at which some entry expires.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.entries
            .iter()
            .map(|entry| entry.expires_at(self.ttl))
            .min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> + '_ {
        self.entries.iter()
    }
}
