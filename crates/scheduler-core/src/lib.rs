//! # Scheduler Core Library
//!
//! Task scheduling with lazily resolved recurrence: a task carries a due date
//! and an optional repeat rule, and its date is moved forward only when the
//! task is written or completed.
//!
//! ## Core Modules
//!
//! - [`recurrence`]: Repeat rule grammar and next-date resolution
//! - [`lifecycle`]: Write-time normalization and completion decisions
//! - [`models`]: Core data structures and transfer objects
//! - [`repository`]: Storage contract with SQLite and in-memory adapters
//! - [`db`]: Database connection and migration management
//! - [`timezone`]: "Today" in a configured timezone
//! - [`error`]: Error types shared by all of the above
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scheduler_core::{
//!     db, lifecycle::TaskLifecycle, models::TaskInput, repository::SqliteRepository, timezone,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), scheduler_core::error::CoreError> {
//!     let pool = db::establish_connection("store/scheduler.db").await?;
//!     let lifecycle = TaskLifecycle::new(Arc::new(SqliteRepository::new(pool)));
//!     let today = timezone::today_in("UTC")?;
//!
//!     let id = lifecycle
//!         .add_task(
//!             TaskInput {
//!                 title: "Water the plants".to_string(),
//!                 repeat: "d 3".to_string(),
//!                 ..Default::default()
//!             },
//!             today,
//!         )
//!         .await?;
//!     println!("Created task {}", id);
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod recurrence;
pub mod repository;
pub mod timezone;
