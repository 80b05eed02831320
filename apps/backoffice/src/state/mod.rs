//! # State Module
//!
//! Application state shared by the commands.
//!
//! Instead of a single struct containing everything, each concern has its
//! own state type and each command takes only the ones it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      App (lib.rs)                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              │                                          │
//! │          ┌──────────────────┼──────────────────┐                       │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │   DbState    │  │  CartState   │  │   ConfigState    │              │
//! │  │              │  │              │  │                  │              │
//! │  │  Database    │  │  Arc<Mutex<  │  │  Arc<RwLock<     │              │
//! │  │  (SQLite     │  │    Cart      │  │    AppConfig     │              │
//! │  │   pool)      │  │  >>          │  │  >>              │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
pub mod config;
mod db;

pub use cart::CartState;
pub use config::{ConfigError, ConfigState};
pub use db::DbState;
