//! Run context management.
//!
//! A [`RunContext`] is created once per build and carries the profile being
//! built, a type-keyed [`ValueBag`] steps use to pass data to each other,
//! and the artifacts the build produced.

mod bag;
mod run_context;


pub use bag::ValueBag;
pub use run_context::RunContext;
