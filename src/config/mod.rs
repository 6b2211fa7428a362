mod config;
mod default;
mod param;

pub use config::AgentConfig;
pub use param::ParamValue;
