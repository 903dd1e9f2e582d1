//! Test-fixture provisioner.
//!
//! Creates deterministic security groups for exercising the evaluator
//! end-to-end against a real or simulated provider. Create-or-reuse per
//! group, add-or-skip per rule: the provider's duplicate codes are
//! idempotency signals, not errors. No auditing logic lives here.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};

/// Provider error carrying the provider's machine-readable code.
///
/// Duplicate conditions must be recognized by code, never by the mere
/// presence of an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_duplicate_group(&self) -> bool {
        self.code == "InvalidGroup.Duplicate"
    }

    pub fn is_duplicate_rule(&self) -> bool {
        self.code == "InvalidPermission.Duplicate"
    }
}

/// Narrow interface to the provider's mutation surface. Credential
/// resolution and retries are the implementation's concern.
pub trait ProviderClient {
    /// Id of the default VPC fixtures attach to.
    fn default_vpc_id(&self) -> std::result::Result<String, ProviderError>;

    /// Create a group, returning its id.
    fn create_security_group(
        &self,
        name: &str,
        description: &str,
        vpc_id: &str,
    ) -> std::result::Result<String, ProviderError>;

    /// Look up an existing group's id by name.
    fn security_group_id_by_name(&self, name: &str)
        -> std::result::Result<String, ProviderError>;

    /// Attach one TCP ingress rule to a group.
    fn authorize_ingress(
        &self,
        group_id: &str,
        port: u16,
        cidr: &str,
    ) -> std::result::Result<(), ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRule {
    pub port: u16,
    pub cidr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub rules: Vec<FixtureRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FixtureFile {
    #[serde(rename = "fixture", default)]
    fixtures: Vec<FixtureSpec>,
}

impl FixtureSpec {
    /// The standard fixture set: one FAIL, one FAIL, one WARN, one clean.
    pub fn defaults() -> Vec<FixtureSpec> {
        let open = |name: &str, description: &str, port: u16| FixtureSpec {
            name: name.into(),
            description: description.into(),
            rules: vec![FixtureRule {
                port,
                cidr: "0.0.0.0/0".into(),
            }],
        };
        vec![
            open("test-open-ssh", "SSH open to internet (should FAIL)", 22),
            open("test-open-rdp", "RDP open to internet (should FAIL)", 3389),
            open("test-open-https", "HTTPS open to internet (should WARN)", 443),
            FixtureSpec {
                name: "test-secure".into(),
                description: "No open rules (should PASS)".into(),
                rules: vec![],
            },
        ]
    }

    /// Load fixture specs from a TOML file with `[[fixture]]` tables.
    pub fn load_specs(path: &Path) -> Result<Vec<FixtureSpec>> {
        let content = std::fs::read_to_string(path)?;
        let file: FixtureFile = toml::from_str(&content)?;
        if file.fixtures.is_empty() {
            return Err(AuditError::Config(format!(
                "no [[fixture]] entries in {}",
                path.display()
            )));
        }
        Ok(file.fixtures)
    }
}

/// Result of provisioning one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureOutcome {
    pub group_id: String,
    /// The group already existed and was looked up instead of created.
    pub reused: bool,
    pub rules_added: usize,
    pub rules_skipped: usize,
}

/// Aggregate result of one provisioning run.
#[derive(Debug, Default)]
pub struct ProvisionOutcome {
    /// Fixture name → created-or-reused group.
    pub fixtures: BTreeMap<String, FixtureOutcome>,
    /// Fixtures that hit a non-duplicate provider error.
    pub errors: Vec<AuditError>,
}

impl ProvisionOutcome {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Provision every fixture. A non-duplicate provider error aborts only
/// the fixture it occurred in; the rest still run. Fails outright only
/// when the target VPC cannot be resolved.
pub fn provision(client: &dyn ProviderClient, specs: &[FixtureSpec]) -> Result<ProvisionOutcome> {
    let vpc_id = client
        .default_vpc_id()
        .map_err(|e| AuditError::Provision {
            fixture: "-".into(),
            message: format!("resolving default VPC: {e}"),
        })?;
    tracing::info!(vpc = %vpc_id, fixtures = specs.len(), "provisioning fixtures");

    let mut outcome = ProvisionOutcome::default();
    for spec in specs {
        match provision_one(client, spec, &vpc_id) {
            Ok(fixture) => {
                outcome.fixtures.insert(spec.name.clone(), fixture);
            }
            Err(e) => {
                tracing::warn!(fixture = %spec.name, error = %e, "fixture failed");
                outcome.errors.push(AuditError::Provision {
                    fixture: spec.name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
    Ok(outcome)
}

fn provision_one(
    client: &dyn ProviderClient,
    spec: &FixtureSpec,
    vpc_id: &str,
) -> std::result::Result<FixtureOutcome, ProviderError> {
    let (group_id, reused) =
        match client.create_security_group(&spec.name, &spec.description, vpc_id) {
            Ok(id) => (id, false),
            Err(e) if e.is_duplicate_group() => {
                let id = client.security_group_id_by_name(&spec.name)?;
                tracing::debug!(fixture = %spec.name, group = %id, "already exists, reusing");
                (id, true)
            }
            Err(e) => return Err(e),
        };

    let mut rules_added = 0;
    let mut rules_skipped = 0;
    for rule in &spec.rules {
        match client.authorize_ingress(&group_id, rule.port, &rule.cidr) {
            Ok(()) => rules_added += 1,
            Err(e) if e.is_duplicate_rule() => {
                tracing::debug!(fixture = %spec.name, port = rule.port, "rule already exists");
                rules_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(FixtureOutcome {
        group_id,
        reused,
        rules_added,
        rules_skipped,
    })
}
