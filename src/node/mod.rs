mod node;
mod node_builder;

pub use node::Agent;
pub use node_builder::AgentBuilder;
pub use node_builder::Collaborators;
