use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Broker operation being authorized.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    Read,
    Write,
    Create,
    Delete,
    Alter,
    Describe,
    ClusterAction,
    DescribeConfigs,
    AlterConfigs,
    IdempotentWrite,
    All,
}

impl Operation {
    /// Canonical broker name of the operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Write => "Write",
            Self::Create => "Create",
            Self::Delete => "Delete",
            Self::Alter => "Alter",
            Self::Describe => "Describe",
            Self::ClusterAction => "ClusterAction",
            Self::DescribeConfigs => "DescribeConfigs",
            Self::AlterConfigs => "AlterConfigs",
            Self::IdempotentWrite => "IdempotentWrite",
            Self::All => "All",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    /// Parses broker operation names, ignoring case and underscores.
    fn from_str(value: &str) -> Result<Self> {
        let normalized = normalize(value);
        let op = match normalized.as_str() {
            "read" => Self::Read,
            "write" => Self::Write,
            "create" => Self::Create,
            "delete" => Self::Delete,
            "alter" => Self::Alter,
            "describe" => Self::Describe,
            "clusteraction" => Self::ClusterAction,
            "describeconfigs" => Self::DescribeConfigs,
            "alterconfigs" => Self::AlterConfigs,
            "idempotentwrite" => Self::IdempotentWrite,
            "all" => Self::All,
            _ => return Err(Error::InvalidValue(format!("unknown operation {value}"))),
        };
        Ok(op)
    }
}

/// Kind of broker resource being accessed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceType {
    Topic,
    Group,
    Cluster,
    TransactionalId,
    DelegationToken,
}

impl ResourceType {
    /// Canonical broker name of the resource type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Topic => "Topic",
            Self::Group => "Group",
            Self::Cluster => "Cluster",
            Self::TransactionalId => "TransactionalId",
            Self::DelegationToken => "DelegationToken",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = normalize(value);
        let resource_type = match normalized.as_str() {
            "topic" => Self::Topic,
            "group" => Self::Group,
            "cluster" => Self::Cluster,
            "transactionalid" => Self::TransactionalId,
            "delegationtoken" => Self::DelegationToken,
            _ => {
                return Err(Error::InvalidValue(format!(
                    "unknown resource type {value}"
                )));
            }
        };
        Ok(resource_type)
    }
}

fn normalize(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|ch| *ch != '_')
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_parse_ignores_case_and_underscores() {
        assert_eq!("describe".parse::<Operation>().unwrap(), Operation::Describe);
        assert_eq!("WRITE".parse::<Operation>().unwrap(), Operation::Write);
        assert_eq!(
            "Idempotent_Write".parse::<Operation>().unwrap(),
            Operation::IdempotentWrite
        );
        assert_eq!(
            "IdempotentWrite".parse::<Operation>().unwrap(),
            Operation::IdempotentWrite
        );
    }

    #[test]
    fn operation_parse_rejects_unknown() {
        let err = "publish".parse::<Operation>().expect_err("must reject");
        assert!(err.to_string().contains("publish"));
    }

    #[test]
    fn resource_type_parse() {
        assert_eq!("Topic".parse::<ResourceType>().unwrap(), ResourceType::Topic);
        assert_eq!(
            "transactional_id".parse::<ResourceType>().unwrap(),
            ResourceType::TransactionalId
        );
        assert!("queue".parse::<ResourceType>().is_err());
    }

    #[test]
    fn display_round_trips_names() {
        assert_eq!(Operation::DescribeConfigs.to_string(), "DescribeConfigs");
        assert_eq!(ResourceType::Cluster.to_string(), "Cluster");
    }
}
