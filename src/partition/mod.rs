//! Suite partitioning
//!
//! Splits a specification tree into single-scenario parallel units and one
//! ordered serial unit per grouping.

mod visitor;

pub use visitor::{GroupingPartition, PartitionMode, PartitionResult, PartitionVisitor};
