pub mod collection;
pub mod context;
pub mod error;
pub mod formatter;
pub mod identifier;
pub mod image_styles;
pub mod model;
pub mod ports;
pub mod projector;
pub mod query;
pub mod reference;
pub mod schema;
pub mod service;
