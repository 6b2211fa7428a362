use std::path::PathBuf;

pub const DEFAULT_ARTIFACT_UPDATE_INTERVAL_SECS: u64 = 10;

/// One day.
pub const MAX_ARTIFACT_UPDATE_INTERVAL_SECS: u64 = 86_400;

pub fn default_min_count() -> u32 {
  1
}

pub fn default_auto_checkout() -> bool {
  true
}

pub fn default_extensions_dir() -> PathBuf {
  PathBuf::from("extensions")
}

pub fn default_max_well_known_members() -> usize {
  256
}

pub fn default_supertenant_temp_path() -> PathBuf {
  PathBuf::from("/tmp/-1234/")
}
