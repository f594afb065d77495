//! JOIN algorithm implementations.

mod nested;

pub use nested::{cross_product, NestedLoopJoin};
