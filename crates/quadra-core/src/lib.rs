pub mod batch;
pub mod config;
pub mod db;
pub mod decision;
pub mod error;
pub mod identity;
pub mod invitation;
pub mod io;
pub mod membership;
pub mod paths;
pub mod store;
pub mod types;
pub mod watch;

pub use error::{Result, RosterError};
