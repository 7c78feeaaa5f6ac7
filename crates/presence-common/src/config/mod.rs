//! Configuration structs

mod app_config;

pub use app_config::{
    ApiConfig, ChannelConfig, ClientSettings, ConfigError, Environment, PresenceConfig,
};
