mod deployment;
mod quorum;
mod resolver;
mod well_known;

pub use deployment::DeploymentDescriptor;
pub use deployment::DeploymentRole;
pub use deployment::ServiceGroup;
pub use quorum::QuorumOutcome;
pub use quorum::SeparatedOutcome;
pub use quorum::flat_quorum;
pub use quorum::member_min_count;
pub use quorum::separated_quorum;
pub use resolver::Readiness;
pub use resolver::ReadinessResolver;
pub use well_known::WellKnownMemberSet;
