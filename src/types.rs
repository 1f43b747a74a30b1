//! Core domain and wire types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Marker prefix on client identities for not-yet-persisted work items.
pub const PLACEHOLDER_PREFIX: &str = "new-";

/// A registered user. Credentials live outside this crate; rows exist so
/// project ownership can be enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: Option<String>,
}

/// A project owned by one user. Every project owns a work-item forest
/// rooted at exactly one top-level item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// One task or subtask row.
///
/// `planned_hours` is authoritative only while the item has no children;
/// once it gains children the stored value is superseded by the rollup
/// computed in [`crate::tree::build_item_tree`]. `calendar_event_id` is
/// present exactly when the item currently has a mirrored calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub item_id: i64,
    pub project_id: i64,
    pub parent_item_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub is_completed: bool,
    pub is_minimized: bool,
    pub display_order: Option<i64>,
    pub planned_hours: Option<f64>,
    pub calendar_event_id: Option<String>,
}

/// A work item with its ordered subtasks and rolled-up hours, as produced
/// by the tree builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItemTree {
    #[serde(flatten)]
    pub item: WorkItem,
    /// Bottom-up sum of planned hours: own hours for a leaf, sum of the
    /// children's rollups otherwise.
    pub calculated_planned_hours: f64,
    pub subtasks: Vec<WorkItemTree>,
}

/// An identity as submitted by a client: either a number (or digit string)
/// naming an existing row, or a `new-` prefixed placeholder for a row the
/// store has not assigned an identity to yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientId {
    Number(i64),
    Text(String),
}

/// Classification of a [`ClientId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientIdKind<'a> {
    /// Names an existing row by its store-assigned identity.
    Existing(i64),
    /// A client-generated marker for a not-yet-persisted item.
    Placeholder(&'a str),
    /// Neither numeric nor a placeholder; the node is skipped.
    Malformed,
}

impl ClientId {
    pub fn kind(&self) -> ClientIdKind<'_> {
        match self {
            ClientId::Number(n) => ClientIdKind::Existing(*n),
            ClientId::Text(s) => {
                if s.starts_with(PLACEHOLDER_PREFIX) {
                    ClientIdKind::Placeholder(s)
                } else if let Ok(n) = s.parse::<i64>() {
                    ClientIdKind::Existing(n)
                } else {
                    ClientIdKind::Malformed
                }
            }
        }
    }

    pub fn as_existing(&self) -> Option<i64> {
        match self.kind() {
            ClientIdKind::Existing(n) => Some(n),
            _ => None,
        }
    }
}

/// One node of a client-submitted task tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskNode {
    pub item_id: ClientId,
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_minimized: bool,
    pub display_order: Option<i64>,
    pub planned_hours: Option<f64>,
    #[serde(default)]
    pub subtasks: Vec<TaskNode>,
}

/// A client-submitted mutation batch for one project's work-item tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileRequest {
    pub project_id: i64,
    #[serde(default)]
    pub tasks: Vec<TaskNode>,
    #[serde(default)]
    pub deleted_item_ids: Vec<ClientId>,
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileResponse {
    /// Placeholder identity -> store-assigned identity, one entry per
    /// placeholder encountered in the request.
    pub new_ids_map: HashMap<String, i64>,
    /// Rows removed by the deletion pass (including cascaded descendants).
    pub deleted_rows: usize,
    /// Nodes skipped because their identity was malformed or named a
    /// missing row; each skip covers the node's whole subtree.
    pub skipped_nodes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_classification() {
        assert_eq!(ClientId::Number(42).kind(), ClientIdKind::Existing(42));
        assert_eq!(
            ClientId::Text("42".into()).kind(),
            ClientIdKind::Existing(42)
        );
        assert_eq!(
            ClientId::Text("new-3".into()).kind(),
            ClientIdKind::Placeholder("new-3")
        );
        assert_eq!(ClientId::Text("oops".into()).kind(), ClientIdKind::Malformed);
        assert_eq!(ClientId::Text("".into()).kind(), ClientIdKind::Malformed);
    }

    #[test]
    fn client_id_deserializes_from_number_or_string() {
        let n: ClientId = serde_json::from_str("7").unwrap();
        assert_eq!(n, ClientId::Number(7));
        let s: ClientId = serde_json::from_str("\"new-abc\"").unwrap();
        assert_eq!(s, ClientId::Text("new-abc".into()));
    }
}
