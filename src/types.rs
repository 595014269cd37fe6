use crate::error::{Error, Result};
use std::borrow::Borrow;
use std::fmt;

/// Separates the project and user parts of a canonical identity.
pub const PROJECT_USER_DELIMITER: &str = "__";

/// Separates identities in a resolver-produced identity list.
pub const IDENTITY_DELIMITER: char = ',';

/// Canonical identity of unauthenticated callers.
pub const ANONYMOUS: &str = "ANONYMOUS";

const MAX_NAME_LEN: usize = 128;

fn validate_simple_name(value: &str, kind: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidId(format!("{kind} must not be empty")));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(Error::InvalidId(format!(
            "{kind} length must be <= {MAX_NAME_LEN}"
        )));
    }
    if !trimmed.chars().all(is_allowed_name_char) {
        return Err(Error::InvalidId(format!(
            "{kind} contains invalid characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn is_allowed_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

macro_rules! define_name_type {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Eq, PartialEq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(String);

        impl $name {
            /// Creates a validated name.
            pub fn new(value: impl AsRef<str>) -> Result<Self> {
                validate_simple_name(value.as_ref(), $kind).map(Self)
            }

            /// Returns the underlying string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<&str> for $name {
            type Error = Error;

            fn try_from(value: &str) -> Result<Self> {
                Self::new(value)
            }
        }
    };
}

define_name_type!(
    /// Project name, the part of a canonical identity before `__`.
    ProjectName,
    "project name"
);
define_name_type!(
    /// User name, the part of a canonical identity after `__`.
    UserName,
    "user name"
);

/// Opaque numeric project identifier assigned by the directory.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ProjectId(i64);

impl ProjectId {
    /// Wraps a raw directory id.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for ProjectId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated caller identity.
///
/// The first identity is the canonical `<project>__<user>` string (or
/// [`ANONYMOUS`]); the rest are alternates such as certificate SANs, which
/// only take part in superuser matching.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Principal {
    identities: Vec<String>,
}

impl Principal {
    /// Creates a principal with a single canonical identity.
    pub fn new(canonical: impl Into<String>) -> Self {
        Self {
            identities: vec![canonical.into()],
        }
    }

    /// Creates a principal with a canonical identity and alternates.
    pub fn with_alternates<I, S>(canonical: impl Into<String>, alternates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut identities = vec![canonical.into()];
        identities.extend(alternates.into_iter().map(Into::into));
        Self { identities }
    }

    /// Returns the unauthenticated principal.
    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS)
    }

    /// Parses a delimited identity list, canonical identity first.
    ///
    /// Entries are trimmed and empty entries dropped. An empty list yields
    /// the anonymous principal.
    pub fn parse(raw: &str) -> Self {
        let identities: Vec<String> = raw
            .split(IDENTITY_DELIMITER)
            .map(str::trim)
            .filter(|identity| !identity.is_empty())
            .map(str::to_string)
            .collect();
        if identities.is_empty() {
            return Self::anonymous();
        }
        Self { identities }
    }

    /// Returns the canonical identity.
    pub fn canonical(&self) -> &str {
        &self.identities[0]
    }

    /// Returns every identity, canonical first.
    pub fn identities(&self) -> &[String] {
        &self.identities
    }

    /// Returns true for the anonymous sentinel.
    pub fn is_anonymous(&self) -> bool {
        self.canonical().eq_ignore_ascii_case(ANONYMOUS)
    }

    /// Returns the text before the project/user delimiter, if any.
    pub fn project_prefix(&self) -> Option<&str> {
        self.canonical()
            .split_once(PROJECT_USER_DELIMITER)
            .map(|(project, _)| project)
    }

    /// Splits the canonical identity into its project and user parts.
    pub fn project_user(&self) -> Result<(ProjectName, UserName)> {
        split_identity(self.canonical())
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

/// Splits `<project>__<user>` into validated parts.
pub(crate) fn split_identity(identity: &str) -> Result<(ProjectName, UserName)> {
    let (project, user) = identity.split_once(PROJECT_USER_DELIMITER).ok_or_else(|| {
        Error::InvalidId(format!(
            "identity {identity} is not of the form <project>{PROJECT_USER_DELIMITER}<user>"
        ))
    })?;
    Ok((ProjectName::new(project)?, UserName::new(user)?))
}
