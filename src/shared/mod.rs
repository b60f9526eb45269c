//! Shared Module
//!
//! This module contains types and logic that do not depend on the HTTP
//! server: configuration, error types, contact normalisation and the GIS
//! member profile form model. Everything here is serializable and can be
//! reused by clients that talk to the onboarding API.

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Email and phone normalisation
pub mod contact;

/// GIS member profile form model
pub mod profile;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError, SmtpConfig};
pub use contact::{normalize_email, normalize_phone, Identifier};
pub use error::SharedError;
pub use profile::{DocumentKind, ProfileStatus, RegistrationTab, TabForm};
