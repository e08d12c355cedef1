//! # Graft Support
//!
//! Shared utilities for the Graft object-graph composer.
//!
//! This crate provides:
//! - Rendering of construction paths for error messages
//! - Type-name helpers (shortening, module prefixes, suggestions)

pub mod rendering;
