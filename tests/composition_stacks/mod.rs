//! Composition stacks.
//!
//! - ordering.rs: how each pair of behaviors interacts
//! - vendors.rs: multi-vendor setups like the ones the simulator builds

mod ordering;
