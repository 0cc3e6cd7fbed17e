//! Core type definitions for lampo events

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical path of a stored object
///
/// Backends interpret it as a relative file path, a map key or an object key.
pub type LogicalPath = String;

/// Kind of operation an event reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventType {
    #[serde(rename = "READ")]
    Read,

    #[serde(rename = "WRITE")]
    Write,

    #[serde(rename = "PUT")]
    Put,

    #[serde(rename = "DELETE")]
    Delete,

    #[serde(rename = "UPDATE-APPEND")]
    Append,

    #[serde(rename = "UPDATE-PREPEND")]
    Prepend,
}

impl EventType {
    /// Event type for an update with the given direction
    pub fn for_update(prepend: bool) -> Self {
        if prepend {
            EventType::Prepend
        } else {
            EventType::Append
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Read => "READ",
            EventType::Write => "WRITE",
            EventType::Put => "PUT",
            EventType::Delete => "DELETE",
            EventType::Append => "UPDATE-APPEND",
            EventType::Prepend => "UPDATE-PREPEND",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record emitted after a successful storage operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    /// Operation that succeeded
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// Logical path the operation targeted
    pub path: LogicalPath,

    /// Unix timestamp in seconds
    pub timestamp: i64,

    /// Payload size in bytes; absent for reads and deletes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<usize>,
}

impl Event {
    /// Create an event stamped with the current time
    pub fn new(event_type: EventType, path: impl Into<LogicalPath>, data: Option<usize>) -> Self {
        Self {
            event_type,
            path: path.into(),
            timestamp: Utc::now().timestamp(),
            data,
        }
    }
}
