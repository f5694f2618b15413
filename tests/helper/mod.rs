#![allow(dead_code)]

pub mod registry;

pub use registry::{CountingRegistry, create_test_resolver, create_test_store, start_time};
