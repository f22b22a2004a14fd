//! Taller back-office server
//!
//! Work-order tracking for a small service business: client/service
//! catalogs, payment collection with balance reconciliation, a daily
//! cash journal, and financial reports.
//!
//! # Module structure
//!
//! ```text
//! taller-server/src/
//! ├── core/     # config, state, server lifecycle
//! ├── auth/     # JWT sessions, access-list roles
//! ├── api/      # HTTP routes and handlers
//! ├── db/       # pool, migrations, repositories
//! ├── orders/   # balance reconciliation protocol
//! ├── journal/  # cash journal, day closures
//! ├── reports/  # summaries, CSV export
//! └── utils/    # errors, logging, time, validation
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod journal;
pub mod orders;
pub mod reports;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load .env and initialize logging
pub fn setup_environment() {
    dotenv::dotenv().ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(None, log_dir.as_deref());
}
