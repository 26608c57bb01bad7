//! Adapter implementations of the reminder ports.

pub mod memory;
