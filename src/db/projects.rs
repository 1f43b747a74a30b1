//! Project lifecycle.
//!
//! Every project owns a single top-level work item whose name and
//! description mirror the project's; it is created alongside the project
//! and kept in sync on rename.

use super::items::{self, ItemFields};
use super::Database;
use crate::calendar::CalendarMirror;
use crate::error::AppError;
use crate::types::Project;
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{info, warn};

fn parse_project_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        project_id: row.get("project_id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
    })
}

/// Fail unless the project exists and belongs to the user. The error does
/// not distinguish "missing" from "someone else's".
pub fn check_ownership(conn: &Connection, user_id: i64, project_id: i64) -> Result<()> {
    let owned: Option<i64> = conn
        .query_row(
            "SELECT project_id FROM projects WHERE project_id = ?1 AND user_id = ?2",
            params![project_id, user_id],
            |row| row.get(0),
        )
        .optional()?;
    if owned.is_none() {
        return Err(AppError::not_authorized(project_id).into());
    }
    Ok(())
}

fn name_taken(
    conn: &Connection,
    user_id: i64,
    name: &str,
    exclude_project: Option<i64>,
) -> Result<bool> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT project_id FROM projects WHERE user_id = ?1 AND name = ?2",
            params![user_id, name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(match existing {
        Some(id) => exclude_project != Some(id),
        None => false,
    })
}

impl Database {
    /// Create a project and its root work item.
    pub fn create_project(
        &self,
        user_id: i64,
        name: &str,
        description: Option<&str>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::missing_field("name").into());
        }

        let project = self.with_tx(|tx| {
            if name_taken(tx, user_id, name, None)? {
                return Err(AppError::duplicate_project_name(name).into());
            }

            tx.execute(
                "INSERT INTO projects (user_id, name, description, start_date, end_date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id, name, description, start_date, end_date],
            )?;
            let project_id = tx.last_insert_rowid();

            items::insert_item(
                tx,
                project_id,
                None,
                &ItemFields {
                    name,
                    description,
                    due_date: None,
                    is_completed: false,
                    is_minimized: false,
                    display_order: None,
                    planned_hours: None,
                },
            )?;

            Ok(Project {
                project_id,
                user_id,
                name: name.to_string(),
                description: description.map(|d| d.to_string()),
                start_date,
                end_date,
            })
        })?;

        info!(project_id = project.project_id, user_id, "created project");
        Ok(project)
    }

    /// All projects for a user, soonest end date first.
    pub fn list_projects(&self, user_id: i64) -> Result<Vec<Project>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM projects WHERE user_id = ?1
                 ORDER BY end_date ASC, project_id ASC",
            )?;
            let projects = stmt
                .query_map(params![user_id], parse_project_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(projects)
        })
    }

    /// Ownership-scoped lookup.
    pub fn get_project(&self, user_id: i64, project_id: i64) -> Result<Option<Project>> {
        self.with_conn(|conn| {
            let project = conn
                .query_row(
                    "SELECT * FROM projects WHERE project_id = ?1 AND user_id = ?2",
                    params![project_id, user_id],
                    parse_project_row,
                )
                .optional()?;
            Ok(project)
        })
    }

    /// Update a project's fields, keeping the root work item's name and
    /// description in sync.
    pub fn update_project(
        &self,
        user_id: i64,
        project_id: i64,
        name: &str,
        description: Option<&str>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::missing_field("name").into());
        }

        self.with_tx(|tx| {
            check_ownership(tx, user_id, project_id)?;
            if name_taken(tx, user_id, name, Some(project_id))? {
                return Err(AppError::duplicate_project_name(name).into());
            }

            tx.execute(
                "UPDATE projects SET name = ?1, description = ?2,
                        start_date = ?3, end_date = ?4
                 WHERE project_id = ?5",
                params![name, description, start_date, end_date, project_id],
            )?;

            tx.execute(
                "UPDATE work_items SET name = ?1, description = ?2
                 WHERE project_id = ?3 AND parent_item_id IS NULL",
                params![name, description, project_id],
            )?;

            Ok(Project {
                project_id,
                user_id,
                name: name.to_string(),
                description: description.map(|d| d.to_string()),
                start_date,
                end_date,
            })
        })
    }

    /// Delete a project and everything it owns. Mirrored calendar events
    /// are deleted best-effort before the rows go; a mirror failure is
    /// logged and does not block the local delete.
    pub fn delete_project(
        &self,
        user_id: i64,
        project_id: i64,
        calendar: Option<&dyn CalendarMirror>,
    ) -> Result<()> {
        let event_ids = self.with_conn(|conn| {
            check_ownership(conn, user_id, project_id)?;
            let mut stmt = conn.prepare(
                "SELECT calendar_event_id FROM work_items
                 WHERE project_id = ?1 AND calendar_event_id IS NOT NULL",
            )?;
            let ids = stmt
                .query_map(params![project_id], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })?;

        if let Some(mirror) = calendar {
            for event_id in &event_ids {
                if let Err(err) = mirror.delete_event(event_id) {
                    warn!(%event_id, %err, "failed to delete mirrored event");
                }
            }
        }

        self.with_conn(|conn| {
            // Ownership is re-checked by scoping the delete itself.
            conn.execute(
                "DELETE FROM projects WHERE project_id = ?1 AND user_id = ?2",
                params![project_id, user_id],
            )?;
            Ok(())
        })?;

        info!(project_id, user_id, "deleted project");
        Ok(())
    }
}
