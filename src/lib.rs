//! # slideopt
//!
//! Sliding-window optimization for data-parallel pipeline programs.
//!
//! A pipeline is a graph of named computation stages, each scheduled to be
//! stored and computed at particular loop levels of its consumers. When a
//! stage is computed inside a serial loop and its required footprint moves
//! monotonically with the loop variable, the pass narrows the stage's
//! required-region bounds so each iteration only computes the newly needed
//! slice, reusing values from earlier iterations. Stencil and scan
//! pipelines (blurs, recurrences, multi-stage image pipelines) lose their
//! redundant recomputation without any change in semantics.
//!
//! ## Architecture
//!
//! ```text
//!   ir        expression/statement tree, substitution, an interpreter
//!   pipeline  stages, definitions, schedules
//!   analysis  simplification, proofs, monotonicity, solving, write boxes
//!   transform the sliding-window pass itself
//!   utils     scopes, fresh names, errors, diagnostics
//! ```
//!
//! ## Example
//!
//! ```
//! use slideopt::prelude::*;
//! use slideopt::ir::builder::*;
//! use slideopt::ir::ForKind;
//!
//! // A producer the pass will consider sliding: stage `f` computed inside
//! // its consumer's loop over y.
//! let f = Stage::new("f", &["x"]).computed_at("g", "y");
//! let g = Stage::new("g", &["x"]);
//! let env = stage_map([f, g]);
//!
//! let program = realize(
//!     "f",
//!     for_loop(
//!         "y",
//!         v("y.loop_min"),
//!         v("y.loop_extent"),
//!         ForKind::Serial,
//!         Stmt::Evaluate(lit(0)),
//!     ),
//! );
//! let optimized = sliding_window(&program, &env).unwrap();
//! # let _ = optimized;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod ir;
pub mod pipeline;
pub mod transform;
pub mod utils;

/// Common imports for users of the crate.
pub mod prelude {
    pub use crate::analysis::{can_prove, is_monotonic, simplify, Interval, Monotonic};
    pub use crate::ir::{Expr, ForKind, Stmt};
    pub use crate::pipeline::{stage_map, Definition, LoopLevel, Stage, StageMap, StageSchedule};
    pub use crate::transform::{sliding_window, SlidingWindow};
    pub use crate::utils::{Diagnostics, SlideError, SlideResult};
}

/// Crate version, from the build manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
