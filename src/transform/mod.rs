//! Tree-to-tree optimization passes.

pub mod sliding;

pub use sliding::{sliding_window, SlidingWindow};
