//! # Lustre Back Office Entry Point
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Lustre Back Office                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Tauri webview (counter screen, admin screens)                   │  │
//! │  │        invoke('add_to_cart', { args: { productId } })           │  │
//! │  └──────────────────────────────┬───────────────────────────────────┘  │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Rust back end (this crate)                                      │  │
//! │  │                                                                  │  │
//! │  │  main.rs ────► Exit status                                      │  │
//! │  │  lib.rs ─────► Logging, database, settings, Tauri builder       │  │
//! │  │  ipc.rs ─────► #[tauri::command] handlers                       │  │
//! │  │  commands/ ──► search_products, add_to_cart, checkout, ...      │  │
//! │  └──────────────────────────────┬───────────────────────────────────┘  │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  SQLite: lustre.db (local file, WAL mode)                        │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

// Prevents an additional console window on Windows in release
#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]

fn main() {
    // The actual setup is in lib.rs so tests can reach it
    if let Err(e) = lustre_backoffice::run() {
        eprintln!("lustre-backoffice: {}", e);
        std::process::exit(1);
    }
}
