mod dispatcher;
mod inbound;
mod publisher;
mod types;

pub use dispatcher::EventDispatcher;
pub use inbound::InboundMessage;
pub use inbound::read_feed;
pub use publisher::EventPublisher;
pub use publisher::JsonLinePublisher;
pub use publisher::StatusEvent;
pub use publisher::StatusKind;
pub use publisher::StdoutPublisher;
pub use types::AgentEvent;
pub use types::ArtifactsUpdatedEvent;
pub use types::InstanceCleanupClusterEvent;
pub use types::InstanceCleanupMemberEvent;
pub use types::MemberActivatedEvent;
pub use types::MemberLifecycleEvent;
pub use types::VolumeMountEvent;
