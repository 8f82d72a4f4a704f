//! feedbot-core: building blocks for a small command-driven chat bot that
//! relays the LeetCode daily challenge and Finnhub stock quotes.
//!
//! - [`config`]: Typed configuration from JSON and the environment
//! - [`error`]: Fetch error taxonomy
//! - [`feeds`]: Outbound HTTP clients for the two data feeds
//! - [`format`]: Pure message formatters
//! - [`commands`]: Command registry, handlers and dispatcher
//! - [`bus`]: Async message bus between transports and the bridge
//! - [`gateway`]: Telegram transport, command bridge, health endpoint
//!
//! # Quick Start
//!
//! ```no_run
//! use feedbot_core::commands::Dispatcher;
//! use feedbot_core::config::Config;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let dispatcher = Dispatcher::from_config(&config);
//!
//! if let Some(reply) = dispatcher.dispatch("!s aapl").await {
//!     println!("{}", reply);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bus;
pub mod commands;
pub mod config;
pub mod error;
pub mod feeds;
pub mod format;
pub mod gateway;
