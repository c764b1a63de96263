//! Read-only content API.
//!
//! Projects stored content items and taxonomy terms into JSON, driven by
//! their field schemas, with paginated listings and bounded recursive
//! dereferencing of entity references.

pub mod module;
pub use module::ContentApiModule;

pub use config::ContentApiConfig;
pub use domain::error::DomainError;
pub use domain::service::Service;

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
