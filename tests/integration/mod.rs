//! Integration tests for the vtree flattening engine

mod deferred_build;
mod properties;
mod scenarios;
mod subtree_mutation;
mod support;
