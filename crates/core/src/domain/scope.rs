use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hex characters of the source-location digest kept in a scope name.
const HASH_PREFIX_LEN: usize = 8;

const DELIMITER: char = '-';

/// Namespace inside the cluster manager that a deployment is provisioned into.
///
/// The name is derived from the request alone, so deploying the same revision
/// of the same repository for the same requester always lands in the same scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceScope(String);

impl ResourceScope {
    /// Build `<requester>-<sha256(location)[..8]>-<revision>`.
    pub fn generate(requester_identity: &str, source_location: &str, source_revision: &str) -> Self {
        let digest = Sha256::digest(source_location.as_bytes());
        let hash = hex::encode(digest);

        Self(format!(
            "{}{}{}{}{}",
            requester_identity,
            DELIMITER,
            &hash[..HASH_PREFIX_LEN],
            DELIMITER,
            source_revision
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the transient storage claim; shares the scope name.
    pub fn storage_name(&self) -> &str {
        &self.0
    }

    /// Externally reachable URL for the production workload in this scope.
    pub fn endpoint(&self, config: &EndpointConfig) -> String {
        format!("{}://{}.{}", config.scheme, self.0, config.domain)
    }
}

impl fmt::Display for ResourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceScope {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Scheme and base domain production endpoints are published under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub scheme: String,
    pub domain: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            domain: "yourdomain.com".to_string(),
        }
    }
}
