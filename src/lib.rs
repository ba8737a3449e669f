pub mod config;
pub mod error;
pub mod ingestor;
pub mod logging;
pub mod predicate;
pub mod relay;
pub mod retention;
pub mod timeutil;
pub mod transport;

pub use config::{Cli, LogLevel};
pub use relay::Relay;
pub use transport::AppState;
