pub mod data;
pub mod io;

pub use data::{BridgeConfig, ConfigOverrides, FileConfig};
pub use io::ConfigError;
