//! Configuration for the readeo client and its reference remote store.
//!
//! Values come from environment variables, optionally loaded from a `.env`
//! file in the local data directory. Every value has a default, so a missing
//! `.env` file is not an error.
//!
//! | Variable | Default |
//! |---|---|
//! | `READEO_API_URL` | `http://127.0.0.1:8080` |
//! | `READEO_SERVER_ADDRESS` | `127.0.0.1:8080` |
//! | `READEO_CACHE_PATH` | `{data_local_dir}/readeo/cache.db` |
//! | `READEO_REMOTE_DB` | `{data_local_dir}/readeo/remote.db` |
//! | `READEO_PAGE_SIZE` | `50` |
//! | `READEO_REQUEST_TIMEOUT_SECS` | `30` |

use dotenv;
use std::{env, path::PathBuf, str::FromStr};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Loads `readeo/.env` from the local data directory when it exists.
///
/// Variables already set in the environment win over the file.
///
/// # Errors
///
/// Fails when the data directory cannot be created or the file exists but
/// cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = data_path(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.exists() {
        dotenv::from_path(&path).map_err(|e| format!("{}: {e}", path.display()))?;
    }
    Ok(())
}

/// `file` inside the application's local data directory.
pub fn data_path(file: &str) -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("readeo");
    path.push(file);
    path
}

/// Base URL of the remote store endpoints.
pub fn api_url() -> String {
    env::var("READEO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Bind address of the reference remote store.
pub fn server_addr() -> String {
    env::var("READEO_SERVER_ADDRESS").unwrap_or_else(|_| DEFAULT_SERVER_ADDRESS.to_string())
}

/// Location of the local cache database.
pub fn cache_path() -> PathBuf {
    env::var("READEO_CACHE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_path("cache.db"))
}

/// Location of the reference remote store database.
pub fn remote_db_path() -> PathBuf {
    env::var("READEO_REMOTE_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_path("remote.db"))
}

pub fn page_size() -> usize {
    parsed("READEO_PAGE_SIZE", DEFAULT_PAGE_SIZE)
}

pub fn request_timeout() -> u64 {
    parsed("READEO_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}
