//! Window expression system
//!
//! This module provides the ranking window functions, the expressions that
//! bind them to partition and order keys, and the per-partition evaluation
//! pass.

pub mod window;
pub mod window_functions;

pub use window::*;
pub use window_functions::evaluate_partition;
