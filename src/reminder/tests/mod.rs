//! Unit tests for the reminder module.
//!
//! Tests are organised by concern: pure time math, the task store, the
//! notification scheduler, and the service facade.

mod service_tests;
mod store_tests;
