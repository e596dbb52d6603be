//! Amazon Resource Names.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error parsing an ARN.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArnError {
    /// The value is not six colon-separated segments starting with `arn`.
    #[error("{0:?} is not an ARN: expected arn:partition:service:region:account-id:resource")]
    Malformed(String),

    /// The service segment differs from the expected one.
    #[error("ARN {arn:?} has service {actual:?}, expected {expected:?}")]
    Service {
        /// The offending ARN.
        arn: String,
        /// Expected service name.
        expected: String,
        /// Service name found.
        actual: String,
    },

    /// The resource segment does not start with the expected prefix.
    #[error("ARN {arn:?} resource does not start with {expected:?}")]
    ResourcePrefix {
        /// The offending ARN.
        arn: String,
        /// Expected resource prefix, e.g. `fleet/`.
        expected: String,
    },
}

/// A parsed ARN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Arn {
    /// Partition, e.g. `aws`.
    pub partition: String,
    /// Service namespace, e.g. `appstream`.
    pub service: String,
    /// Region; empty for global services.
    pub region: String,
    /// Account ID; empty for some service-owned resources.
    pub account_id: String,
    /// Resource part, e.g. `fleet/my-fleet`.
    pub resource: String,
}

impl Arn {
    /// Check service name and resource prefix.
    pub fn expect(&self, service: &str, resource_prefix: &str) -> Result<(), ArnError> {
        if self.service != service {
            return Err(ArnError::Service {
                arn: self.to_string(),
                expected: service.to_owned(),
                actual: self.service.clone(),
            });
        }
        if !self.resource.starts_with(resource_prefix) {
            return Err(ArnError::ResourcePrefix {
                arn: self.to_string(),
                expected: resource_prefix.to_owned(),
            });
        }
        Ok(())
    }

    /// The resource name after the first `/`, if any.
    pub fn resource_name(&self) -> Option<&str> {
        self.resource
            .split_once('/')
            .map(|(_, name)| name)
            .filter(|name| !name.is_empty())
    }
}

impl FromStr for Arn {
    type Err = ArnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.splitn(6, ':').collect();
        let [prefix, partition, service, region, account_id, resource] = parts[..] else {
            return Err(ArnError::Malformed(s.to_owned()));
        };
        if prefix != "arn" || partition.is_empty() || service.is_empty() || resource.is_empty() {
            return Err(ArnError::Malformed(s.to_owned()));
        }
        Ok(Self {
            partition: partition.to_owned(),
            service: service.to_owned(),
            region: region.to_owned(),
            account_id: account_id.to_owned(),
            resource: resource.to_owned(),
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}
