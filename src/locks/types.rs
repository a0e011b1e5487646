//! Lock descriptor and deadline definitions.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Scope of a granted lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockScope {
    /// Only the holder may modify the resource.
    Exclusive,
    /// Other shared lock holders may coexist.
    Shared,
}

/// Access type of a granted lock. Write locks are the only kind servers grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
    #[default]
    Write,
}

/// How far down a collection hierarchy the lock reaches.
///
/// Ordered so that a deeper lock compares greater than a shallower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockDepth {
    Zero,
    One,
    Infinity,
}

/// Timeout class the server granted for the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockTimeout {
    Seconds(u32),
    Infinite,
}

/// Semantic properties of a granted lock.
///
/// The store passes this through to the session untouched; it only looks at
/// it to answer filtered token lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockDescriptor {
    pub scope: LockScope,
    pub kind: LockKind,
    pub depth: LockDepth,

    /// Owner string sent along with the lock request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    pub timeout: LockTimeout,
}

impl LockDescriptor {
    /// Exclusive write lock on a single resource, owned by `user@HOST`.
    pub fn exclusive_write(timeout: LockTimeout) -> Self {
        Self {
            scope: LockScope::Exclusive,
            kind: LockKind::Write,
            depth: LockDepth::Zero,
            owner: Some(get_owner_string()),
            timeout,
        }
    }

    /// Shared write lock on a single resource, owned by `user@HOST`.
    pub fn shared_write(timeout: LockTimeout) -> Self {
        Self {
            scope: LockScope::Shared,
            ..Self::exclusive_write(timeout)
        }
    }

    /// Whether a lock held with `self` is good enough for a request that
    /// needs `requested`.
    ///
    /// An exclusive lock satisfies a shared request but not the other way
    /// round, and the held depth must reach at least as far as requested.
    /// Owner and timeout are not compared.
    pub fn satisfies(&self, requested: &LockDescriptor) -> bool {
        if self.kind != requested.kind {
            return false;
        }
        if self.scope == LockScope::Shared && requested.scope == LockScope::Exclusive {
            return false;
        }
        self.depth >= requested.depth
    }
}

/// Absolute point in time after which an unrefreshed lease is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deadline {
    /// Never expires and is never refreshed.
    Infinite,
    At(DateTime<Utc>),
}

impl Deadline {
    /// Build a deadline from seconds since the Unix epoch.
    ///
    /// Negative values (conventionally `-1`) denote an infinite lock.
    pub fn from_epoch_seconds(secs: i64) -> Self {
        if secs < 0 {
            return Deadline::Infinite;
        }
        match Utc.timestamp_opt(secs, 0).single() {
            Some(at) => Deadline::At(at),
            None => Deadline::Infinite,
        }
    }

    /// Deadline `duration` from now.
    ///
    /// A point beyond the representable range is treated as infinite.
    pub fn after(duration: Duration) -> Self {
        Utc::now()
            .checked_add_signed(duration)
            .map_or(Deadline::Infinite, Deadline::At)
    }

    /// Seconds since the Unix epoch, or `-1` for an infinite lock.
    pub fn epoch_seconds(&self) -> i64 {
        match self {
            Deadline::Infinite => -1,
            Deadline::At(at) => at.timestamp(),
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Deadline::Infinite)
    }

    /// Whether the deadline falls within `lead` of `now` and a refresh
    /// should be sent. Infinite deadlines are never due.
    pub fn is_due(&self, now: DateTime<Utc>, lead: Duration) -> bool {
        match self {
            Deadline::Infinite => false,
            // Underflow means the deadline lies before any representable lead point.
            Deadline::At(at) => at.checked_sub_signed(lead).is_none_or(|t| t <= now),
        }
    }
}

impl std::fmt::Display for Deadline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Deadline::Infinite => write!(f, "infinite"),
            Deadline::At(at) => write!(f, "{}", at.to_rfc3339()),
        }
    }
}

/// Get the owner string for lock descriptors.
pub(crate) fn get_owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}
