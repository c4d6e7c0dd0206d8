//! Layered configuration profiles.
//!
//! A [`Profile`] stores typed component values and depends on other
//! profiles. Reading a component yields its effective value: the profile's
//! own value if set, otherwise the first value found among its
//! dependencies. Dependencies form a DAG; cycles are rejected.
//!
//! ```rust,ignore
//! let base = catalog.create_with(|p| p.set_component(Compression(3)));
//! let release = catalog.create();
//! release.add_dependency(&base)?;
//! assert!(release.is_component_inherited::<Compression>());
//! ```

mod catalog;
mod components;
mod document;
mod store;

#[cfg(test)]
mod profile_tests;

pub use catalog::ProfileCatalog;
pub use components::{ComponentSource, ResolvedComponent};
pub use document::DeserializeReport;
pub use store::{Profile, ProfileId};
