pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod models;
pub mod templates;
pub mod validator;

pub use error::{Error, Result};
