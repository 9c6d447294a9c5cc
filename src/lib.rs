//! Contract analyzer - upload contracts and extract their key terms
//!
//! This is the library interface for the contract analyzer, exposing the
//! token auth core, document extraction, analysis and the HTTP router.

pub mod analysis;
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod contracts;
pub mod error;
pub mod extract;
pub mod store;

pub use config::Config;
pub use error::Error;
