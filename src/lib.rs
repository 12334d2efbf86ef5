//! Typing Race Server - real-time relay for multiplayer typing races
//!
//! Library root so integration tests can drive the match coordinator
//! directly; `main.rs` is a thin entrypoint over these modules.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
