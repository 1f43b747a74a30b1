//! Work-item row store primitives.
//!
//! The free functions take a `&Connection` so the reconciler can run them
//! inside its own transaction; the `Database` methods wrap the common
//! read paths for callers outside a transaction.

use super::Database;
use crate::types::WorkItem;
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub fn parse_item_row(row: &Row) -> rusqlite::Result<WorkItem> {
    Ok(WorkItem {
        item_id: row.get("item_id")?,
        project_id: row.get("project_id")?,
        parent_item_id: row.get("parent_item_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        is_completed: row.get::<_, i64>("is_completed")? != 0,
        is_minimized: row.get::<_, i64>("is_minimized")? != 0,
        display_order: row.get("display_order")?,
        planned_hours: row.get("planned_hours")?,
        calendar_event_id: row.get("calendar_event_id")?,
    })
}

/// All rows for one project, unordered. Sibling ordering is applied by the
/// tree builder, not here.
pub fn list_items(conn: &Connection, project_id: i64) -> Result<Vec<WorkItem>> {
    let mut stmt = conn.prepare("SELECT * FROM work_items WHERE project_id = ?1")?;
    let items = stmt
        .query_map(params![project_id], parse_item_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

pub fn get_item(conn: &Connection, project_id: i64, item_id: i64) -> Result<Option<WorkItem>> {
    let item = conn
        .query_row(
            "SELECT * FROM work_items WHERE item_id = ?1 AND project_id = ?2",
            params![item_id, project_id],
            parse_item_row,
        )
        .optional()?;
    Ok(item)
}

/// Field values shared by insert and update.
pub struct ItemFields<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub due_date: Option<NaiveDate>,
    pub is_completed: bool,
    pub is_minimized: bool,
    pub display_order: Option<i64>,
    /// Pass `None` when the item has subtasks; stored hours are only
    /// authoritative on leaves.
    pub planned_hours: Option<f64>,
}

/// Insert a row and return its store-assigned identity.
pub fn insert_item(
    conn: &Connection,
    project_id: i64,
    parent_item_id: Option<i64>,
    fields: &ItemFields,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO work_items (
            project_id, parent_item_id, name, description, due_date,
            is_completed, is_minimized, display_order, planned_hours
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            project_id,
            parent_item_id,
            fields.name,
            fields.description,
            fields.due_date,
            fields.is_completed as i64,
            fields.is_minimized as i64,
            fields.display_order,
            fields.planned_hours,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Update a row in place, including re-parenting. Returns false when no
/// row with that identity exists in the project.
pub fn update_item(
    conn: &Connection,
    project_id: i64,
    item_id: i64,
    parent_item_id: Option<i64>,
    fields: &ItemFields,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE work_items SET
            parent_item_id = ?1, name = ?2, description = ?3, due_date = ?4,
            is_completed = ?5, is_minimized = ?6, display_order = ?7,
            planned_hours = ?8
         WHERE item_id = ?9 AND project_id = ?10",
        params![
            parent_item_id,
            fields.name,
            fields.description,
            fields.due_date,
            fields.is_completed as i64,
            fields.is_minimized as i64,
            fields.display_order,
            fields.planned_hours,
            item_id,
            project_id,
        ],
    )?;
    Ok(changed > 0)
}

pub fn set_calendar_event_id(
    conn: &Connection,
    project_id: i64,
    item_id: i64,
    event_id: Option<&str>,
) -> Result<()> {
    conn.execute(
        "UPDATE work_items SET calendar_event_id = ?1
         WHERE item_id = ?2 AND project_id = ?3",
        params![event_id, item_id, project_id],
    )?;
    Ok(())
}

/// Expand a set of identities to include every descendant, scoped to one
/// project. Identities in `item_ids` that match no row are dropped.
pub fn collect_subtree_ids(
    conn: &Connection,
    project_id: i64,
    item_ids: &[i64],
) -> Result<Vec<i64>> {
    let mut all = Vec::new();
    let mut stmt = conn.prepare(
        "WITH RECURSIVE descendants AS (
            SELECT item_id FROM work_items
             WHERE item_id = ?1 AND project_id = ?2
            UNION ALL
            SELECT w.item_id FROM work_items w
            JOIN descendants d ON w.parent_item_id = d.item_id
        )
        SELECT item_id FROM descendants",
    )?;
    for &id in item_ids {
        let ids = stmt
            .query_map(params![id, project_id], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        all.extend(ids);
    }
    all.sort_unstable();
    all.dedup();
    Ok(all)
}

/// Mirrored event identifiers for a set of rows.
pub fn calendar_event_ids(
    conn: &Connection,
    project_id: i64,
    item_ids: &[i64],
) -> Result<Vec<String>> {
    let mut events = Vec::new();
    let mut stmt = conn.prepare(
        "SELECT calendar_event_id FROM work_items
         WHERE item_id = ?1 AND project_id = ?2
           AND calendar_event_id IS NOT NULL",
    )?;
    for &id in item_ids {
        let found = stmt
            .query_row(params![id, project_id], |row| row.get::<_, String>(0))
            .optional()?;
        if let Some(event_id) = found {
            events.push(event_id);
        }
    }
    Ok(events)
}

/// Delete rows by identity; descendants go with them via the parent FK
/// cascade. Returns the number of rows the statements matched directly,
/// which excludes cascaded descendants. Use [`collect_subtree_ids`] first
/// when the full count matters.
pub fn delete_items(conn: &Connection, project_id: i64, item_ids: &[i64]) -> Result<usize> {
    let mut deleted = 0;
    let mut stmt =
        conn.prepare("DELETE FROM work_items WHERE item_id = ?1 AND project_id = ?2")?;
    for &id in item_ids {
        deleted += stmt.execute(params![id, project_id])?;
    }
    Ok(deleted)
}

/// The project's top-level item (null parent).
pub fn root_item_id(conn: &Connection, project_id: i64) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT item_id FROM work_items
             WHERE project_id = ?1 AND parent_item_id IS NULL",
            params![project_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

impl Database {
    /// All work items for a project the user owns.
    pub fn list_project_items(&self, user_id: i64, project_id: i64) -> Result<Vec<WorkItem>> {
        self.with_conn(|conn| {
            super::projects::check_ownership(conn, user_id, project_id)?;
            list_items(conn, project_id)
        })
    }

    /// The project's nested item tree with hour rollups, ready to render.
    pub fn project_item_tree(
        &self,
        user_id: i64,
        project_id: i64,
    ) -> Result<Vec<crate::types::WorkItemTree>> {
        let items = self.list_project_items(user_id, project_id)?;
        Ok(crate::tree::build_item_tree(items))
    }
}
