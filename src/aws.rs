//! `aws` CLI-backed transport.
//!
//! Shells out to the AWS CLI instead of linking an SDK, so credential
//! resolution, retries and signing stay with the CLI's own config. Both
//! halves sit behind the core's trait seams: [`AwsCliInventory`] is a
//! [`PageSource`], [`AwsCliProvider`] a [`ProviderClient`].

use std::process::Command;

use serde::Deserialize;

use crate::collector::PageSource;
use crate::model::raw::DescribeSecurityGroupsPage;
use crate::provision::{ProviderClient, ProviderError};

/// Inventory source over `aws ec2 describe-security-groups`.
#[derive(Debug, Clone, Default)]
pub struct AwsCliInventory {
    pub region: Option<String>,
    /// Page size passed as `--max-items`; `None` lets the CLI pick.
    pub page_size: Option<usize>,
}

impl PageSource for AwsCliInventory {
    fn fetch_page(&self, token: Option<&str>) -> Result<DescribeSecurityGroupsPage, String> {
        let mut args: Vec<String> = vec![
            "ec2".into(),
            "describe-security-groups".into(),
            "--output".into(),
            "json".into(),
        ];
        if let Some(region) = &self.region {
            args.push("--region".into());
            args.push(region.clone());
        }
        if let Some(size) = self.page_size {
            args.push("--max-items".into());
            args.push(size.to_string());
        }
        if let Some(token) = token {
            args.push("--starting-token".into());
            args.push(token.to_string());
        }

        let stdout = run_aws(&args).map_err(|e| e.to_string())?;
        serde_json::from_slice(&stdout).map_err(|e| format!("unexpected CLI output: {e}"))
    }
}

/// Mutation client over `aws ec2 create-security-group` /
/// `authorize-security-group-ingress`.
#[derive(Debug, Clone, Default)]
pub struct AwsCliProvider {
    pub region: Option<String>,
}

#[derive(Deserialize)]
struct CreateGroupResponse {
    #[serde(rename = "GroupId")]
    group_id: String,
}

#[derive(Deserialize)]
struct DescribeVpcsResponse {
    #[serde(rename = "Vpcs", default)]
    vpcs: Vec<VpcRecord>,
}

#[derive(Deserialize)]
struct VpcRecord {
    #[serde(rename = "VpcId")]
    vpc_id: String,
}

impl AwsCliProvider {
    fn run(&self, base: &[&str]) -> Result<Vec<u8>, ProviderError> {
        let mut args: Vec<String> = base.iter().map(|s| s.to_string()).collect();
        args.push("--output".into());
        args.push("json".into());
        if let Some(region) = &self.region {
            args.push("--region".into());
            args.push(region.clone());
        }
        run_aws(&args)
    }
}

impl ProviderClient for AwsCliProvider {
    fn default_vpc_id(&self) -> Result<String, ProviderError> {
        let stdout = self.run(&[
            "ec2",
            "describe-vpcs",
            "--filters",
            "Name=is-default,Values=true",
        ])?;
        let response: DescribeVpcsResponse = serde_json::from_slice(&stdout)
            .map_err(|e| ProviderError::new("MalformedResponse", e.to_string()))?;
        response
            .vpcs
            .into_iter()
            .next()
            .map(|v| v.vpc_id)
            .ok_or_else(|| ProviderError::new("VpcNotFound", "account has no default VPC"))
    }

    fn create_security_group(
        &self,
        name: &str,
        description: &str,
        vpc_id: &str,
    ) -> Result<String, ProviderError> {
        let stdout = self.run(&[
            "ec2",
            "create-security-group",
            "--group-name",
            name,
            "--description",
            description,
            "--vpc-id",
            vpc_id,
        ])?;
        let response: CreateGroupResponse = serde_json::from_slice(&stdout)
            .map_err(|e| ProviderError::new("MalformedResponse", e.to_string()))?;
        Ok(response.group_id)
    }

    fn security_group_id_by_name(&self, name: &str) -> Result<String, ProviderError> {
        let stdout = self.run(&["ec2", "describe-security-groups", "--group-names", name])?;
        let page: DescribeSecurityGroupsPage = serde_json::from_slice(&stdout)
            .map_err(|e| ProviderError::new("MalformedResponse", e.to_string()))?;
        page.security_groups
            .into_iter()
            .next()
            .map(|g| g.group_id)
            .ok_or_else(|| ProviderError::new("InvalidGroup.NotFound", name))
    }

    fn authorize_ingress(
        &self,
        group_id: &str,
        port: u16,
        cidr: &str,
    ) -> Result<(), ProviderError> {
        let port = port.to_string();
        self.run(&[
            "ec2",
            "authorize-security-group-ingress",
            "--group-id",
            group_id,
            "--protocol",
            "tcp",
            "--port",
            &port,
            "--cidr",
            cidr,
        ])?;
        Ok(())
    }
}

fn run_aws(args: &[String]) -> Result<Vec<u8>, ProviderError> {
    let output = Command::new("aws")
        .args(args)
        .output()
        .map_err(|e| ProviderError::new("CliUnavailable", format!("running aws CLI: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(parse_cli_error(stderr.trim()));
    }
    Ok(output.stdout)
}

/// Extract the provider error code from CLI stderr.
///
/// The CLI reports failures as
/// `An error occurred (InvalidGroup.Duplicate) when calling ...`; the
/// parenthesized code is what duplicate detection keys on.
fn parse_cli_error(stderr: &str) -> ProviderError {
    let code = stderr
        .split_once("An error occurred (")
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(code, _)| code.to_string())
        .unwrap_or_else(|| "CliError".into());
    ProviderError::new(code, stderr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_error_code() {
        let e = parse_cli_error(
            "An error occurred (InvalidGroup.Duplicate) when calling the \
             CreateSecurityGroup operation: The security group 'test-open-ssh' already exists",
        );
        assert_eq!(e.code, "InvalidGroup.Duplicate");
        assert!(e.is_duplicate_group());
    }

    #[test]
    fn unrecognized_stderr_gets_generic_code() {
        let e = parse_cli_error("Unable to locate credentials");
        assert_eq!(e.code, "CliError");
        assert!(!e.is_duplicate_group());
    }
}
