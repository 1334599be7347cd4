//! Integration tests for the relic version-control engine

mod test_utils;

mod integrity_check;
mod merge_flow;
mod repository_lifecycle;
mod tree_determinism;
