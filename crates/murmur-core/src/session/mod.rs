//! Session lifecycle: token issuance, validation, update, deletion.

pub mod manager;
pub mod token;

pub use manager::SessionManager;
pub use token::TokenGenerator;
