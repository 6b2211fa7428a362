pub mod artifact;
pub mod cluster;
pub mod config;
pub mod error;
pub mod event;
pub mod extension;
pub mod node;
pub mod topology;

#[cfg(test)]
pub(crate) mod testing;
