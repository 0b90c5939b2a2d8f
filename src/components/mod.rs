//! Reusable canvas components.

pub mod concept_graph;
