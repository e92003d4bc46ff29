//! Unit test suite, organized by the layer under test.

mod domain_tests;
mod memory_repository_tests;
mod project_service_tests;

pub(crate) mod fixtures;
