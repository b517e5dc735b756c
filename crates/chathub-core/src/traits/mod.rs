//! Core traits defined in `chathub-core` and implemented by other crates.

pub mod token;

pub use token::TokenValidator;
