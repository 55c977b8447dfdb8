//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types used by material parameters and clear colors
//! - Logging setup
//! - Content digests for cache keys

pub mod math;
pub mod logging;
pub mod digest;
