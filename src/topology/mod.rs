//! Internal graph topology: handles, records, and the mutation engine.

pub mod builder;
pub mod collapse;
pub mod graph;
pub mod handles;
pub mod label;
pub mod records;
