//! Gateway: chat transports, the command bridge and the health endpoint.

pub mod bridge;
pub mod channels;
pub mod health;
pub mod utils;

pub use bridge::CommandBridge;
