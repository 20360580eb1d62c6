pub mod activity;
pub mod campaign;
pub mod config;
pub mod demo;
pub mod error;
pub mod generation;
pub mod io;
pub mod lead;
pub mod leads;
pub mod message;
pub mod parse;
pub mod prompt;
pub mod stage;
pub mod store;
pub mod types;
pub mod validation;
pub mod workspace;

pub use error::{LeadflowError, Result};
