//! The filter/facet/sort query contract: typed parameter parsing plus the
//! in-memory evaluation engine. The SQL-backed evaluation lives with the
//! store (`store::sql`) but implements the same semantics.

pub mod engine;
pub mod params;

pub use params::{FilterSpec, SortDir, SortKey};
