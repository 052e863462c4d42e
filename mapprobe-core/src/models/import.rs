//! Import transaction status.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Remote status of a map-import transaction.
///
/// `Done` and `Error` are terminal; anything the remote reports that is not
/// one of the known values is kept verbatim in [`ImportStatus::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ImportStatus {
    /// The import is still running.
    #[default]
    Processing,
    /// The import finished and can be delivered.
    Done,
    /// The import failed remotely.
    Error,
    /// Unrecognised status value.
    Unknown(String),
}

impl ImportStatus {
    /// Parses the remote status string.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Processing" => Self::Processing,
            "Done" => Self::Done,
            "Error" => Self::Error,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns true if polling should stop on this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Returns the wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Processing => "Processing",
            Self::Done => "Done",
            Self::Error => "Error",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ImportStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ImportStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known() {
        assert_eq!(ImportStatus::parse("Done"), ImportStatus::Done);
        assert_eq!(ImportStatus::parse("Error"), ImportStatus::Error);
        assert_eq!(ImportStatus::parse("Processing"), ImportStatus::Processing);
    }

    #[test]
    fn test_parse_unknown_keeps_raw_value() {
        let status = ImportStatus::parse("Pending");
        assert_eq!(status, ImportStatus::Unknown("Pending".to_string()));
        assert_eq!(status.as_str(), "Pending");
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_terminal() {
        assert!(ImportStatus::Done.is_terminal());
        assert!(ImportStatus::Error.is_terminal());
        assert!(!ImportStatus::Processing.is_terminal());
    }
}
