//! Contact discovery.

pub mod resolver;

pub use resolver::ContactResolver;
