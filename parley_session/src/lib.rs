#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! SQLite-backed session storage.
//!
//! One row per allow-listed user in the `users` table:
//! `user_id` (primary key), `conversation_count`, `context`.

mod entity;
mod manager;

pub use manager::SessionManager;
