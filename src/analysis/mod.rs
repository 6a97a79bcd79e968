//! Symbolic analyses consumed by the sliding-window pass.

pub mod bounds;
pub mod monotonic;
pub mod simplify;
pub mod solve;

pub use bounds::box_provided;
pub use monotonic::{is_monotonic, Monotonic};
pub use simplify::{can_prove, equal, lower_unsafe_promises, simplify};
pub use solve::{solve_for_inner, Interval};
