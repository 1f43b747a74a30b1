//! Tree Reconciler: applies a client-submitted task tree to the row store
//! and keeps the calendar mirror in step.
//!
//! The whole request runs in one SQLite transaction. Ownership failures
//! and validation failures mutate nothing; a store failure mid-request
//! rolls every row mutation back. Calendar calls are best-effort and never
//! abort the transaction.

use crate::calendar::CalendarMirror;
use crate::db::items::{self, ItemFields};
use crate::db::projects::check_ownership;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::types::{ClientIdKind, ReconcileRequest, ReconcileResponse, TaskNode};
use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Maximum nesting depth accepted in a submitted tree. Deeper requests are
/// rejected before any row is touched.
pub const MAX_TREE_DEPTH: usize = 64;

struct WalkState<'a> {
    calendar: Option<&'a dyn CalendarMirror>,
    project_id: i64,
    new_ids: HashMap<String, i64>,
    skipped_nodes: usize,
}

/// Apply a mutation batch to one project the user owns.
///
/// Returns the placeholder-to-real identity map so the client can adopt
/// the store-assigned identities.
pub fn reconcile(
    db: &Database,
    calendar: Option<&dyn CalendarMirror>,
    user_id: i64,
    request: &ReconcileRequest,
) -> AppResult<ReconcileResponse> {
    let depth = forest_depth(&request.tasks);
    if depth > MAX_TREE_DEPTH {
        return Err(AppError::invalid_value(
            "tasks",
            &format!("tree nesting exceeds the maximum depth of {}", MAX_TREE_DEPTH),
        ));
    }

    let response = db
        .with_tx(|tx| {
            check_ownership(tx, user_id, request.project_id)?;

            let mut state = WalkState {
                calendar,
                project_id: request.project_id,
                new_ids: HashMap::new(),
                skipped_nodes: 0,
            };

            let deleted_rows = apply_deletions(tx, &state, &request.deleted_item_ids)?;

            // Top-level nodes hang off the project's root item.
            let root = items::root_item_id(tx, request.project_id)?;
            for node in &request.tasks {
                apply_node(tx, &mut state, node, root)?;
            }

            Ok(ReconcileResponse {
                new_ids_map: state.new_ids,
                deleted_rows,
                skipped_nodes: state.skipped_nodes,
            })
        })
        .map_err(AppError::from)?;

    info!(
        project_id = request.project_id,
        user_id,
        new_items = response.new_ids_map.len(),
        deleted_rows = response.deleted_rows,
        skipped_nodes = response.skipped_nodes,
        "reconciled work-item tree"
    );
    Ok(response)
}

/// Delete the requested rows and their descendants, removing mirrored
/// events first. Non-numeric entries in the deletion list are ignored.
fn apply_deletions(
    conn: &Connection,
    state: &WalkState,
    deleted_item_ids: &[crate::types::ClientId],
) -> Result<usize> {
    let requested: Vec<i64> = deleted_item_ids
        .iter()
        .filter_map(|id| id.as_existing())
        .collect();
    if requested.is_empty() {
        return Ok(0);
    }

    // The full subtree set, for mirror cleanup and an exact row count;
    // the delete itself only needs the requested roots since the FK
    // cascade takes their descendants.
    let doomed = items::collect_subtree_ids(conn, state.project_id, &requested)?;

    if let Some(mirror) = state.calendar {
        for event_id in items::calendar_event_ids(conn, state.project_id, &doomed)? {
            if let Err(err) = mirror.delete_event(&event_id) {
                warn!(%event_id, %err, "failed to delete mirrored event");
            }
        }
    }

    items::delete_items(conn, state.project_id, &requested)?;
    Ok(doomed.len())
}

fn apply_node(
    conn: &Connection,
    state: &mut WalkState,
    node: &TaskNode,
    parent: Option<i64>,
) -> Result<()> {
    let name = node.name.trim();
    if name.is_empty() {
        return Err(AppError::missing_field("name").into());
    }

    let fields = ItemFields {
        name,
        description: node.description.as_deref(),
        due_date: node.due_date,
        is_completed: node.is_completed,
        is_minimized: node.is_minimized,
        display_order: node.display_order,
        // Hours on a node with subtasks are superseded by the rollup.
        planned_hours: if node.subtasks.is_empty() {
            node.planned_hours
        } else {
            None
        },
    };

    let item_id = match node.item_id.kind() {
        ClientIdKind::Placeholder(placeholder) => {
            let item_id = items::insert_item(conn, state.project_id, parent, &fields)?;
            debug!(item_id, placeholder, "inserted work item");

            if let (Some(mirror), Some(date)) = (state.calendar, node.due_date) {
                let event_id = match mirror.create_event(
                    name,
                    node.description.as_deref().unwrap_or(""),
                    date,
                ) {
                    Ok(event_id) => Some(event_id),
                    Err(err) => {
                        warn!(item_id, %err, "failed to create mirrored event");
                        None
                    }
                };
                items::set_calendar_event_id(
                    conn,
                    state.project_id,
                    item_id,
                    event_id.as_deref(),
                )?;
            }

            state.new_ids.insert(placeholder.to_string(), item_id);
            item_id
        }

        ClientIdKind::Existing(item_id) => {
            let Some(existing) = items::get_item(conn, state.project_id, item_id)? else {
                // Updating nothing and then inserting children under a
                // missing parent would break the parent FK; skip the
                // whole subtree instead.
                let skipped = subtree_size(node);
                state.skipped_nodes += skipped;
                warn!(item_id, skipped, "work item not found, skipping subtree");
                return Ok(());
            };

            items::update_item(conn, state.project_id, item_id, parent, &fields)?;

            if let Some(mirror) = state.calendar {
                match node.due_date {
                    Some(date) => {
                        // Replace rather than patch: drop the stale event,
                        // mint a fresh one for the current fields.
                        if let Some(old) = &existing.calendar_event_id {
                            if let Err(err) = mirror.delete_event(old) {
                                warn!(item_id, %err, "failed to delete mirrored event");
                            }
                        }
                        let event_id = match mirror.create_event(
                            name,
                            node.description.as_deref().unwrap_or(""),
                            date,
                        ) {
                            Ok(event_id) => Some(event_id),
                            Err(err) => {
                                warn!(item_id, %err, "failed to create mirrored event");
                                None
                            }
                        };
                        items::set_calendar_event_id(
                            conn,
                            state.project_id,
                            item_id,
                            event_id.as_deref(),
                        )?;
                    }
                    None => {
                        if let Some(old) = &existing.calendar_event_id {
                            if let Err(err) = mirror.delete_event(old) {
                                warn!(item_id, %err, "failed to delete mirrored event");
                            }
                            // Cleared even when the delete failed; the row
                            // no longer has a due date to mirror.
                            items::set_calendar_event_id(conn, state.project_id, item_id, None)?;
                        }
                    }
                }
            }

            item_id
        }

        ClientIdKind::Malformed => {
            let skipped = subtree_size(node);
            state.skipped_nodes += skipped;
            warn!(
                client_id = ?node.item_id,
                skipped,
                "malformed work-item identity, skipping subtree"
            );
            return Ok(());
        }
    };

    for child in &node.subtasks {
        apply_node(conn, state, child, Some(item_id))?;
    }
    Ok(())
}

fn forest_depth(nodes: &[TaskNode]) -> usize {
    nodes
        .iter()
        .map(|node| 1 + forest_depth(&node.subtasks))
        .max()
        .unwrap_or(0)
}

fn subtree_size(node: &TaskNode) -> usize {
    1 + node
        .subtasks
        .iter()
        .map(subtree_size)
        .sum::<usize>()
}
