pub mod env;
mod hook;
mod runner;

pub use env::EnvParams;
pub use hook::ExtensionHook;
pub use runner::ExtensionRunner;
pub use runner::ScriptExtensionRunner;
