//! Run classification.
//!
//! Load-test producers encode protocol, test type, VU count and replica count
//! in the output file name (`grpc_scalability_4r.json`). That convention is
//! parsed exactly once, when a run is ingested, into a [`RunMetadata`].
//! Explicit metadata from the config file takes precedence over the name.
//!
//! Only the protocol marker is matched case-insensitively; test type and
//! replica markers must appear in lower case. The VU count is never read
//! from the name: it follows the test type unless configured explicitly.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Replica counts recognised in run names, checked in this order.
pub const REPLICA_COUNTS: [u32; 4] = [1, 2, 4, 8];

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Protocol {
    #[strum(to_string = "REST")]
    #[serde(rename = "REST", alias = "rest", alias = "Rest")]
    Rest,
    #[strum(to_string = "gRPC")]
    #[serde(rename = "gRPC", alias = "grpc", alias = "GRPC")]
    Grpc,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Monitoring,
    Scalability,
    Resilience,
}

impl TestType {
    /// VU count assumed when the run name does not state one.
    pub fn default_vus(self) -> u32 {
        match self {
            TestType::Monitoring => 300,
            TestType::Scalability | TestType::Resilience => 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryKey {
    pub protocol: Protocol,
    pub test_type: TestType,
    pub vus: u32,
    pub replicas: u32,
}

/// A key field that was not encoded in the run name and fell back to its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DefaultedField {
    Protocol,
    TestType,
    Replicas,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunMetadata {
    pub key: CategoryKey,
    /// Fields that were neither configured nor found in the name.
    pub defaulted: SmallVec<[DefaultedField; 3]>,
    /// Whether a config override contributed to the key.
    pub explicit: bool,
}

impl RunMetadata {
    pub fn is_defaulted(&self) -> bool {
        !self.defaulted.is_empty()
    }

    /// Classifies a run by its name only.
    pub fn from_name(name: &str) -> Self {
        Self::resolve(name, None)
    }

    /// Classifies a run by name, then applies any explicit override on top.
    pub fn resolve(name: &str, explicit: Option<&RunOverride>) -> Self {
        let mut defaulted = SmallVec::new();

        let protocol = match explicit.and_then(|o| o.protocol) {
            Some(p) => p,
            None => protocol_marker(name).unwrap_or_else(|| {
                defaulted.push(DefaultedField::Protocol);
                Protocol::Rest
            }),
        };

        let test_type = match explicit.and_then(|o| o.test_type) {
            Some(t) => t,
            None => test_type_marker(name).unwrap_or_else(|| {
                defaulted.push(DefaultedField::TestType);
                TestType::Monitoring
            }),
        };

        let replicas = match explicit.and_then(|o| o.replicas) {
            Some(r) => r,
            None => replica_marker(name).unwrap_or_else(|| {
                // Replica count only matters as the scalability variable.
                if test_type == TestType::Scalability {
                    defaulted.push(DefaultedField::Replicas);
                }
                1
            }),
        };

        let vus = explicit
            .and_then(|o| o.vus)
            .unwrap_or_else(|| test_type.default_vus());

        Self {
            key: CategoryKey {
                protocol,
                test_type,
                vus,
                replicas,
            },
            defaulted,
            explicit: explicit.is_some(),
        }
    }
}

/// Metadata supplied explicitly for a named run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunOverride {
    /// Run (file) name this entry applies to.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_type: Option<TestType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vus: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
}

fn protocol_marker(name: &str) -> Option<Protocol> {
    let lower = name.to_ascii_lowercase();
    if lower.contains("grpc") {
        Some(Protocol::Grpc)
    } else if lower.contains("rest") {
        Some(Protocol::Rest)
    } else {
        None
    }
}

fn test_type_marker(name: &str) -> Option<TestType> {
    // Resilience wins when a name mentions both.
    if name.contains("resilience") {
        Some(TestType::Resilience)
    } else if name.contains("scalability") || name.contains("replica") {
        Some(TestType::Scalability)
    } else if name.contains("monitoring") {
        Some(TestType::Monitoring)
    } else {
        None
    }
}

fn replica_marker(name: &str) -> Option<u32> {
    REPLICA_COUNTS.into_iter().find(|&r| has_replicas(name, r))
}

fn has_replicas(name: &str, r: u32) -> bool {
    name.contains(&format!("{r}r")) || name.contains(&format!("{r}_replica"))
}
