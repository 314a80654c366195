//! # CLI Module
//!
//! Command implementations of the `readeo` binary:
//!
//! - [`serve`] - runs the reference remote store
//! - [`import`] - rebuilds the local cache from the remote store, page by page
//! - [`list`] - prints cached records as a table or as JSON
//! - [`info`] - compares local and remote record counts
//! - [`login`] - checks a credential pair against the remote store
//!
//! Commands report through the `info!`/`success!`/`warning!`/`error!` macros
//! and exit on unrecoverable failures; library code underneath logs through
//! `tracing`.

mod auth;
mod import;
mod info;
mod list;
mod serve;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use auth::login;
pub use import::import;
pub use info::info;
pub use list::list;
pub use serve::serve;

use crate::{error, management::ManagerContext};

fn open_context() -> ManagerContext {
    match ManagerContext::from_config() {
        Ok(context) => context,
        Err(e) => error!("Cannot open the local cache. Err: {}", e),
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
