use std::fmt;

/// Points in the node lifecycle where a user extension script runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionHook {
  InstanceStarted,
  InstanceActivated,
  ArtifactsUpdated,
  MemberActivated,
  Cleanup,
  VolumeMount,
  CopyArtifacts,
}

impl ExtensionHook {
  pub fn name(&self) -> &'static str {
    match self {
      ExtensionHook::InstanceStarted => "instance-started",
      ExtensionHook::InstanceActivated => "instance-activated",
      ExtensionHook::ArtifactsUpdated => "artifacts-updated",
      ExtensionHook::MemberActivated => "member-activated",
      ExtensionHook::Cleanup => "cleanup",
      ExtensionHook::VolumeMount => "volume-mount",
      ExtensionHook::CopyArtifacts => "copy-artifacts",
    }
  }

  pub fn script_name(&self) -> String {
    format!("{}.sh", self.name())
  }
}

impl fmt::Display for ExtensionHook {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}
