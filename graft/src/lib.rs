//! # Graft — startup-time object-graph composer
//!
//! Graft builds every component declared under a namespace exactly once,
//! wiring constructor dependencies and string properties, and hands back a
//! [`Container`] of singletons.
//!
//! ```rust,ignore
//! use graft::{Component, Container, Properties};
//! use std::sync::Arc;
//!
//! #[derive(Component)]
//! struct Config {
//!     #[component(property = "app.name")]
//!     name: String,
//! }
//!
//! #[derive(Component)]
//! struct Server {
//!     config: Arc<Config>,
//! }
//!
//! let properties = Properties::new().with("app.name", "demo");
//! let container = Container::inject(properties, module_path!())?;
//! let server: Arc<Server> = container.get_injected().unwrap();
//! assert_eq!(server.config.name, "demo");
//! ```
//!
//! Failures are reported as [`GraftError`]: cycles, unknown dependencies,
//! ambiguous constructors, failed instantiation and invalid namespaces.

pub use graft_container::*;
pub use graft_derive::*;
pub use graft_support::*;
