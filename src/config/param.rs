use std::fmt;
use std::str::FromStr;

/// Outcome of reading an optional, free-form parameter.
///
/// Callers decide the fallback: `Absent` silently, `Invalid` with a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue<T> {
  Absent,
  Invalid(String),
  Valid(T),
}

impl<T> ParamValue<T>
where
  T: FromStr,
{
  /// Parse a raw value. Surrounding whitespace is ignored and an empty
  /// string counts as absent.
  pub fn parse(raw: Option<&str>) -> Self {
    match raw.map(str::trim) {
      None | Some("") => ParamValue::Absent,
      Some(value) => match value.parse::<T>() {
        Ok(parsed) => ParamValue::Valid(parsed),
        Err(_) => ParamValue::Invalid(value.to_string()),
      },
    }
  }
}

impl<T> ParamValue<T> {
  /// Keep a valid value only if it passes `check`.
  pub fn require(self, check: impl FnOnce(&T) -> bool) -> Self
  where
    T: fmt::Display,
  {
    match self {
      ParamValue::Valid(value) if !check(&value) => ParamValue::Invalid(value.to_string()),
      other => other,
    }
  }
}
