//! Event types delivered by backend listeners.
//!
//! All types are `Clone + Send + Sync` for use with tokio broadcast channels.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::user::Session;

/// Why the session changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionChange {
    SignedIn,
    SignedOut,
    Expired,
}

/// A session-change notification from the auth provider.
///
/// `seq` is assigned by the provider and strictly increases; consumers
/// discard anything not newer than what they already applied.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub seq: u64,
    pub change: SessionChange,
    pub session: Option<Session>,
}

impl SessionEvent {
    pub fn signed_in(seq: u64, session: Session) -> Self {
        Self {
            seq,
            change: SessionChange::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out(seq: u64) -> Self {
        Self {
            seq,
            change: SessionChange::SignedOut,
            session: None,
        }
    }

    pub fn expired(seq: u64) -> Self {
        Self {
            seq,
            change: SessionChange::Expired,
            session: None,
        }
    }
}

/// Tables that emit change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Posts,
    Profiles,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Posts => "posts",
            Table::Profiles => "profiles",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row-level operation that produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A realtime table-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableChange {
    pub table: Table,
    pub kind: ChangeKind,
    /// Primary key of the affected row, when the source knows it.
    pub row_id: Option<String>,
}

impl TableChange {
    pub fn new(table: Table, kind: ChangeKind, row_id: impl Into<String>) -> Self {
        Self {
            table,
            kind,
            row_id: Some(row_id.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_out_has_no_session() {
        let event = SessionEvent::signed_out(7);
        assert_eq!(event.seq, 7);
        assert_eq!(event.change, SessionChange::SignedOut);
        assert!(event.session.is_none());
    }

    #[test]
    fn test_table_change_serialization() {
        let change = TableChange::new(Table::Posts, ChangeKind::Insert, "abc");
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["table"], "posts");
        assert_eq!(json["kind"], "insert");
        assert_eq!(json["row_id"], "abc");
    }
}
