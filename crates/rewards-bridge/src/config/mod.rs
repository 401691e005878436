//! Bridge configuration.

pub mod bridge_config;

pub use bridge_config::BridgeConfig;
