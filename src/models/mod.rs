//! Data models for partitioned suite execution
//!
//! This module contains the specification tree, annotation handling and the
//! execution units built from them.

pub mod tag;
mod tree;
mod unit;

pub use tag::TagFilter;
pub use tree::{Annotations, Grouping, GroupingInfo, Scenario, SharedSetup, SpecTree, Step};
pub use unit::{ExecutionUnit, UnitMode};
