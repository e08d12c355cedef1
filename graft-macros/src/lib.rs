//! Procedural macros for Graft.
//!
//! Use them through the `graft` crate, which re-exports everything the
//! generated code refers to.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod component;

/// Derives `graft::Component` and registers the type for discovery.
///
/// Every field is a constructor parameter. Fields marked
/// `#[component(property = "key")]` are filled from the property source
/// and must be `String` or `Option<String>`; all others are dependencies
/// (`Arc<T>` or `Capability<dyn Trait>`).
///
/// Struct-level options:
/// - `namespace = "app::web"`: overrides the module path used for discovery
/// - `provides(ty = "Pool", method = "pool")`: a factory method `fn(&self) -> Pool`
/// - `provides(ty = "dyn Store", method = "store", shared)`: `fn(&self) -> Arc<dyn Store>`
/// - `capability = "dyn Clock"`: the component can be injected as `Capability<dyn Clock>`
/// - `after_create = "warm_up"`: a hook `fn(&self)` or `fn(&self) -> Result<(), E>`
///
/// ```rust,ignore
/// #[derive(Component)]
/// #[component(after_create = "connect", capability = "dyn Repository")]
/// struct Database {
///     #[component(property = "db.url")]
///     url: String,
///     pool: Arc<Pool>,
/// }
/// ```
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match component::expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into(),
    }
}
