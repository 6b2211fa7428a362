use std::collections::BTreeMap;

use tracing::debug;
use tracing::warn;

use crate::topology::Member;

/// Members already counted as well-known: member id to last seen IP.
///
/// Only grows while the agent runs. It is emptied by [`WellKnownMemberSet::reset`]
/// on an explicit topology re-sync, and implicitly by an agent restart.
#[derive(Debug, Clone)]
pub struct WellKnownMemberSet {
  members: BTreeMap<String, String>,
  capacity: usize,
}

impl WellKnownMemberSet {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      members: BTreeMap::new(),
      capacity,
    }
  }

  /// Record a member. Returns false if the set is full and the member is new.
  pub fn insert(&mut self, member: &Member) -> bool {
    if let Some(known_ip) = self.members.get_mut(&member.member_id) {
      if *known_ip != member.member_ip {
        debug!(
          member_id = %member.member_id,
          old_ip = %known_ip,
          new_ip = %member.member_ip,
          "Well-known member IP changed"
        );
        *known_ip = member.member_ip.clone();
      }
      return true;
    }

    if self.members.len() >= self.capacity {
      warn!(
        member_id = %member.member_id,
        capacity = self.capacity,
        "Well-known member set is full, member not recorded"
      );
      return false;
    }

    self
      .members
      .insert(member.member_id.clone(), member.member_ip.clone());
    true
  }

  pub fn contains(&self, member_id: &str) -> bool {
    self.members.contains_key(member_id)
  }

  pub fn contains_ip(&self, member_ip: &str) -> bool {
    self.members.values().any(|ip| ip == member_ip)
  }

  pub fn len(&self) -> usize {
    self.members.len()
  }

  pub fn is_empty(&self) -> bool {
    self.members.is_empty()
  }

  pub fn reset(&mut self) {
    debug!(count = self.members.len(), "Resetting well-known member set");
    self.members.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::topology::MemberStatus;

  fn member(id: &str, ip: &str) -> Member {
    Member {
      member_id: id.to_string(),
      member_ip: ip.to_string(),
      public_ip: String::new(),
      status: MemberStatus::Activated,
      properties: Default::default(),
      cluster_id: "c1".to_string(),
      lb_cluster_id: None,
      network_partition_id: String::new(),
    }
  }

  #[test]
  fn test_insert_tracks_ip_changes() {
    let mut set = WellKnownMemberSet::with_capacity(4);
    assert!(set.insert(&member("m1", "10.0.0.1")));
    assert!(set.contains_ip("10.0.0.1"));

    assert!(set.insert(&member("m1", "10.0.0.9")));
    assert_eq!(1, set.len());
    assert!(!set.contains_ip("10.0.0.1"));
    assert!(set.contains_ip("10.0.0.9"));
  }

  #[test]
  fn test_capacity_bound_and_reset() {
    let mut set = WellKnownMemberSet::with_capacity(2);
    assert!(set.insert(&member("m1", "10.0.0.1")));
    assert!(set.insert(&member("m2", "10.0.0.2")));
    assert!(!set.insert(&member("m3", "10.0.0.3")));
    assert_eq!(2, set.len());
    assert!(!set.contains("m3"));

    set.reset();
    assert!(set.is_empty());
    assert!(set.insert(&member("m3", "10.0.0.3")));
  }
}
