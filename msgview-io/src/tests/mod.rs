//! Test modules for msgview-io
//!
//! File-level tests that go through the public import entry points with
//! real files in a scratch directory.

pub mod import_tests;
