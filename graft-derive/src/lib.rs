//! Derive support for Graft components.
//!
//! ```rust,ignore
//! use graft::Component;
//!
//! #[derive(Component)]
//! struct Clock;
//! ```

pub use graft_macros::Component;
