//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and poses
//! - Collections (identity registries with flat snapshots)
//! - Logging utilities

pub mod collections;
pub mod logging;
pub mod math;
