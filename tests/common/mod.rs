//! Shared doubles and fixtures for the integration tests.

#![allow(dead_code)] // Not every test binary uses every helper

pub mod builders;
pub mod mock_providers;

pub use builders::*;
pub use mock_providers::*;
