//! # dynbind-std
//!
//! Standard implementations for the dynbind binding registry.
//!
//! This crate provides:
//! - **Converters**: string and timestamp coercion ([`converters`])
//! - **Filters**: [`LoggingFilter`], [`AutoInject`]
//! - **Transports**: [`HttpTransport`] (feature `http`)
//! - **Testing**: recording filters and a mock transport ([`testing`])
//!
//! [`LoggingFilter`]: filters::LoggingFilter
//! [`AutoInject`]: filters::AutoInject
//! [`HttpTransport`]: transport::HttpTransport

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use dynbind_core;

// Modules
pub mod converters;
pub mod filters;
pub mod testing;
#[cfg(feature = "http")]
pub mod transport;
