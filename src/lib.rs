//! Tickler: the reminder engine behind a personal task manager.
//!
//! A user creates a task with a title, an optional note, and a due
//! date/time; tickler persists the task, schedules one local notification
//! to fire at that instant, and removes the task once it has fired or
//! expired. The crate is an in-process library boundary (no CLI, no
//! network protocol) consumed by whatever UI hosts it.
//!
//! # Architecture
//!
//! Tickler follows hexagonal architecture principles:
//!
//! - **Domain**: Pure task model and time math with no infrastructure
//!   dependencies
//! - **Ports**: Abstract trait interfaces for the host notification
//!   facility and durable storage
//! - **Adapters**: Concrete implementations of ports (in-memory reference
//!   adapters; platform adapters live with the host)
//!
//! # Modules
//!
//! - [`reminder`]: Task lifecycle, notification scheduling, and
//!   reconciliation

pub mod reminder;
