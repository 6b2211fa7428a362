use tracing::debug;
use tracing::warn;

use crate::config::ParamValue;
use crate::topology::Cluster;
use crate::topology::MIN_COUNT_PROPERTY;
use crate::topology::Member;

/// Result of testing one group of candidates against a threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumOutcome<'a> {
  pub ready: bool,
  /// Qualifying members, in candidate order.
  pub selected: Vec<&'a Member>,
  /// The threshold the selection was tested against.
  pub min_count: u32,
}

/// Threshold carried by a member's `MIN_COUNT` property, or `default`.
pub fn member_min_count(member: &Member, default: u32) -> u32 {
  match ParamValue::<u32>::parse(member.property(MIN_COUNT_PROPERTY)).require(|n| *n > 0) {
    ParamValue::Valid(min_count) => min_count,
    ParamValue::Absent => default,
    ParamValue::Invalid(raw) => {
      warn!(
        member_id = %member.member_id,
        value = %raw,
        default,
        "Invalid MIN_COUNT member property, using default"
      );
      default
    }
  }
}

/// Single-cluster quorum: primary members that are starting or activated.
///
/// The first selected member decides the threshold through its `MIN_COUNT`
/// property, falling back to `base_min_count`. Later members are not
/// consulted, so the result depends on member order.
pub fn flat_quorum(candidates: &[Member], base_min_count: u32) -> QuorumOutcome<'_> {
  let selected: Vec<&Member> = candidates
    .iter()
    .filter(|member| member.is_well_known_candidate())
    .collect();

  let min_count = selected
    .first()
    .map(|member| member_min_count(member, base_min_count))
    .unwrap_or(base_min_count);

  QuorumOutcome {
    ready: selected.len() >= min_count as usize,
    selected,
    min_count,
  }
}

/// Manager and worker groups evaluated independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatedOutcome<'a> {
  pub manager: QuorumOutcome<'a>,
  pub worker: QuorumOutcome<'a>,
  /// Every manager member is non-primary and the manager cluster count
  /// reaches the manager threshold.
  pub manager_fallback: bool,
}

impl SeparatedOutcome<'_> {
  pub fn manager_ready(&self) -> bool {
    self.manager.ready || self.manager_fallback
  }

  pub fn ready(&self) -> bool {
    self.manager_ready() && self.worker.ready
  }
}

/// Evaluate the first manager cluster and the first worker cluster.
///
/// Returns `None` when either side has no cluster at all.
pub fn separated_quorum<'a>(
  manager_clusters: &'a [Cluster],
  worker_clusters: &'a [Cluster],
) -> Option<SeparatedOutcome<'a>> {
  let manager_members = manager_clusters.first()?.members();
  let worker_members = worker_clusters.first()?.members();

  let manager = flat_quorum(manager_members, 1);
  let worker = flat_quorum(worker_members, 1);

  // With no primary manager selected, the threshold comes from the first
  // manager member whatever its flags.
  let fallback_min_count = if manager.selected.is_empty() {
    manager_members
      .first()
      .map(|member| member_min_count(member, 1))
      .unwrap_or(1)
  } else {
    manager.min_count
  };

  let all_managers_non_primary = manager_members.iter().all(|member| !member.is_primary());

  // Compares a cluster count with a member threshold. Kept as observed in
  // deployed agents; it is very likely a unit mix-up.
  let manager_fallback =
    all_managers_non_primary && manager_clusters.len() >= fallback_min_count as usize;

  debug!(
    all_managers_non_primary,
    manager_min_count = fallback_min_count,
    manager_ready = manager.ready,
    worker_ready = worker.ready,
    "Separated quorum evaluated"
  );

  Some(SeparatedOutcome {
    manager,
    worker,
    manager_fallback,
  })
}
