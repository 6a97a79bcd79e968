//! Shared utilities: scopes, fresh names, errors, diagnostics.

pub mod diagnostics;
pub mod errors;
pub mod names;
pub mod scope;

pub use diagnostics::Diagnostics;
pub use errors::{SlideError, SlideResult};
pub use names::NameGen;
pub use scope::Scope;
