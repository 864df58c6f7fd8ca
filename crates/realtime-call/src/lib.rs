mod client;
pub mod types;

pub use client::{
    CallClient, Client, ClientTx, Config, ConfigBuilder, ServerRx, Stats, connect,
    connect_with_config,
};
