pub mod assistant_loader;
pub mod config;
pub mod console;
pub mod realtime_adapter;

pub use realtime_call::types as call_types;
