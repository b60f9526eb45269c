//! Common test utilities and helpers
//!
//! - Database fixtures (in-memory SQLite)
//! - In-process app with a recording OTP sender
//! - Authentication helpers
//! - Assertion macros

#![allow(dead_code)]

pub mod assertions;
pub mod auth_helpers;
pub mod database;
pub mod mock_server;

pub use auth_helpers::*;
pub use database::*;
pub use mock_server::*;
