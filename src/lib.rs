//! LifeMap work-item engine.
//!
//! SQLite-backed storage for per-user projects of hierarchical work items,
//! a tree builder with bottom-up hour rollups, and a reconciler that
//! applies client-submitted tree edits and mirrors due dates to an
//! external calendar.

pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod reconcile;
pub mod tree;
pub mod types;
