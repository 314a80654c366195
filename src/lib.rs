//! Readeo dual-store entity manager.
//!
//! Entities of the Readeo reading app (authors, cities, countries, profiles
//! and users) live in two places: an authoritative remote store reached over
//! HTTP/JSON and a local SQLite cache rebuilt from it. This library provides
//! the managers that read and write both, the request coordinator they share,
//! and a reference implementation of the remote store.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the reference remote store
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `coordinator` - Per-key tracking of in-flight remote requests
//! - `entities` - Typed records and their hydration
//! - `error` - Error types of the storage, remote and hydration layers
//! - `management` - Entity managers over both stores
//! - `remote` - HTTP client of the remote store
//! - `schema` - Table and column vocabulary, DDL
//! - `server` - Router and listener of the reference remote store
//! - `store` - Embedded SQLite storage
//! - `types` - Command-line table rows and arguments
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use readeo::{config, management::{Managers, ManagerContext}};
//!
//! #[tokio::main]
//! async fn main() -> readeo::Res<()> {
//!     config::load_env().await?;
//!     let managers = Managers::new(ManagerContext::from_config()?);
//!     managers.import_all(config::page_size()).await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod entities;
pub mod error;
pub mod management;
pub mod remote;
pub mod schema;
pub mod server;
pub mod store;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Provides a standard error handling pattern throughout the application
/// using a boxed dynamic error trait object. This allows for flexible
/// error handling while maintaining Send + Sync bounds for async contexts.
///
/// # Type Parameters
///
/// - `T` - The success type returned on successful operations
///
/// # Example
///
/// ```
/// use readeo::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// Creates a formatted output line with a distinctive blue "o" indicator
/// followed by the provided message. Used for general information and
/// status updates throughout the application.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// info!("Starting import...");
/// info!("Imported {} authors", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// Creates a formatted output line with a green "✓" indicator to signify
/// successful completion of operations. Used to provide positive feedback
/// when operations complete successfully.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// success!("Logged in");
/// success!("Imported {} users", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Creates a formatted error output with a red "!" indicator and immediately
/// terminates the program with exit code 1. Used for unrecoverable errors
/// that require immediate program termination.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Behavior
///
/// This macro will cause the program to exit immediately after printing
/// the error message. It should only be used for fatal errors where
/// recovery is not possible.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration");
/// error!("Missing required environment variable: {}", var_name);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Creates a formatted output line with a yellow "!" indicator to highlight
/// potential issues or important notices that don't require program termination.
/// Used for recoverable issues or important information that users should notice.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// warning!("Local cache is outdated");
/// warning!("Import stopped early for {}", table);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
