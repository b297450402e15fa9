#![deny(missing_docs)]
//! Steam Deals Telegram Bot
//!
//! A Telegram bot that announces CheapShark deals to a channel and serves
//! interactive Steam store lookups through inline queries and callback
//! buttons, backed by a TTL cache and a bounded seen-deals tracker.

/// Telegram bot implementation
pub mod bot;
/// Generic TTL cache shared across concurrent tasks
pub mod cache;
/// Configuration management
pub mod config;
/// Bounded-concurrency fan-out
pub mod fanout;
/// Steam and CheapShark API clients
pub mod steam;
/// Message formatting and HTML cleanup
pub mod templates;
