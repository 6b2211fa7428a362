mod context;
mod types;

pub use context::TopologyContext;
pub use context::TopologySource;
pub use types::Cluster;
pub use types::Member;
pub use types::MemberStatus;
pub use types::Port;
pub use types::Service;
pub use types::Topology;
pub use types::PRIMARY_PROPERTY;
pub use types::MIN_COUNT_PROPERTY;
