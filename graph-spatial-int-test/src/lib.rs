//! Integration test support for `graph_spatial`.
//!
//! Suites run against [`memory_graph::MemoryGraph`] by default. With the
//! `neo4j` feature they run against the server named by the
//! `GRAPH_SPATIAL_*` environment variables instead.

pub mod memory_graph;
pub mod test_util;
