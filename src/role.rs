use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

const DATA_OWNER: &str = "Data owner";
const DATA_SCIENTIST: &str = "Data scientist";

/// Membership role of a user within a project.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProjectRole {
    /// Full read/write access to the project's topics.
    DataOwner,
    /// Read and describe access to the project's topics.
    DataScientist,
    /// Any role the permission matrix does not recognize.
    Other(String),
}

impl ProjectRole {
    /// Directory spelling of the role.
    pub fn as_str(&self) -> &str {
        match self {
            Self::DataOwner => DATA_OWNER,
            Self::DataScientist => DATA_SCIENTIST,
            Self::Other(role) => role,
        }
    }
}

impl fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectRole {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let role = if trimmed.eq_ignore_ascii_case(DATA_OWNER) {
            Self::DataOwner
        } else if trimmed.eq_ignore_ascii_case(DATA_SCIENTIST) {
            Self::DataScientist
        } else {
            Self::Other(trimmed.to_string())
        };
        Ok(role)
    }
}

/// Cross-project share grant kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SharePermission {
    ReadOnly,
    Editable,
    EditableByOwners,
}

impl SharePermission {
    /// Directory spelling of the permission.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "READ_ONLY",
            Self::Editable => "EDITABLE",
            Self::EditableByOwners => "EDITABLE_BY_OWNERS",
        }
    }

    /// Role the grant confers on members of the requesting project.
    ///
    /// Only read-only shares map to a role; editable shares confer none, so
    /// every operation under them is denied.
    pub fn effective_role(self) -> Option<ProjectRole> {
        match self {
            Self::ReadOnly => Some(ProjectRole::DataScientist),
            Self::Editable | Self::EditableByOwners => None,
        }
    }
}

impl fmt::Display for SharePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SharePermission {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "READ_ONLY" => Ok(Self::ReadOnly),
            "EDITABLE" => Ok(Self::Editable),
            "EDITABLE_BY_OWNERS" => Ok(Self::EditableByOwners),
            _ => Err(Error::InvalidValue(format!(
                "unknown share permission {value}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_recognizes_directory_spelling() {
        assert_eq!("Data owner".parse::<ProjectRole>().unwrap(), ProjectRole::DataOwner);
        assert_eq!(
            " data scientist ".parse::<ProjectRole>().unwrap(),
            ProjectRole::DataScientist
        );
        assert_eq!(
            "Auditor".parse::<ProjectRole>().unwrap(),
            ProjectRole::Other("Auditor".to_string())
        );
    }

    #[test]
    fn share_parse_and_effective_role() {
        let share = "read_only".parse::<SharePermission>().unwrap();
        assert_eq!(share, SharePermission::ReadOnly);
        assert_eq!(share.effective_role(), Some(ProjectRole::DataScientist));
        assert_eq!(SharePermission::Editable.effective_role(), None);
        assert_eq!(SharePermission::EditableByOwners.effective_role(), None);
        assert!("WRITE_ALL".parse::<SharePermission>().is_err());
    }
}
