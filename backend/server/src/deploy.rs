//! # Deploy hook
//!
//! GitHub push webhook that refreshes the checkout the server runs from.
//!
//! ## Verification
//! - `X-Hub-Signature-256: sha256=<hex hmac_sha256(secret, body)>`
//! - No secret configured means the route does not exist
//!
//! ## Commands
//! 1. `git pull`
//! 2. `chmod a+x <target>`
//!
//! Both run in the deploy directory; stdout of each is returned to the caller.
use std::{path::PathBuf, process::Stdio};

use axum::http::HeaderMap;
use tokio::process::Command;
use tracing::{info, warn};

use crate::{config::Config, error::AppError, utils::verify_hex};

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

#[derive(Debug, Clone)]
pub struct DeployStep {
    pub program: String,
    pub args: Vec<String>,
}

impl DeployStep {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Deployer {
    secret: Option<String>,
    dir: PathBuf,
    steps: Vec<DeployStep>,
}

impl Deployer {
    pub fn new(secret: Option<String>, dir: PathBuf, steps: Vec<DeployStep>) -> Self {
        Self { secret, dir, steps }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.webhook_secret.clone(),
            config.deploy_dir.clone(),
            vec![
                DeployStep::new("git", &["pull"]),
                DeployStep::new("chmod", &["a+x", &config.deploy_chmod_target]),
            ],
        )
    }

    pub fn authorize(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), AppError> {
        let secret = self.secret.as_deref().ok_or(AppError::WebhookDisabled)?;

        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("sha256="))
            .ok_or(AppError::InvalidSignature)?;

        if verify_hex(secret.as_bytes(), body, signature) {
            Ok(())
        } else {
            Err(AppError::InvalidSignature)
        }
    }

    /// Runs every step in order and returns their combined stdout.
    pub async fn run(&self) -> Result<String, AppError> {
        let mut combined = String::new();

        for step in &self.steps {
            let output = Command::new(&step.program)
                .args(&step.args)
                .current_dir(&self.dir)
                .stdin(Stdio::null())
                .output()
                .await?;

            let stdout = String::from_utf8_lossy(&output.stdout);
            if output.status.success() {
                info!("{} {} finished", step.program, step.args.join(" "));
            } else {
                warn!(
                    "{} {} exited with {}: {}",
                    step.program,
                    step.args.join(" "),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                combined.push_str(&format!("[{} {}] ", step.program, output.status));
            }

            combined.push_str(&stdout);
        }

        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::utils::sign;

    fn signed(secret: &str, body: &[u8]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = format!("sha256={}", hex::encode(sign(secret.as_bytes(), body)));
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(&value).unwrap());
        headers
    }

    fn deployer(secret: Option<&str>, steps: Vec<DeployStep>) -> Deployer {
        Deployer::new(secret.map(String::from), std::env::temp_dir(), steps)
    }

    #[test]
    fn test_disabled_without_secret() {
        let hook = deployer(None, vec![]);

        assert!(matches!(
            hook.authorize(&signed("anything", b"{}"), b"{}"),
            Err(AppError::WebhookDisabled)
        ));
    }

    #[test]
    fn test_signature_must_match_body() {
        let hook = deployer(Some("hook-secret"), vec![]);

        assert!(hook.authorize(&signed("hook-secret", b"{}"), b"{}").is_ok());
        assert!(matches!(
            hook.authorize(&signed("hook-secret", b"{}"), b"{\"x\":1}"),
            Err(AppError::InvalidSignature)
        ));
        assert!(matches!(
            hook.authorize(&HeaderMap::new(), b"{}"),
            Err(AppError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn test_run_combines_output() {
        let hook = deployer(
            Some("s"),
            vec![
                DeployStep::new("echo", &["pulled"]),
                DeployStep::new("echo", &["chmodded"]),
            ],
        );

        assert_eq!(hook.run().await.unwrap(), "pulled\nchmodded\n");
    }

    #[tokio::test]
    async fn test_unspawnable_command_is_an_error() {
        let hook = deployer(Some("s"), vec![DeployStep::new("definitely-not-a-binary", &[])]);

        assert!(matches!(hook.run().await, Err(AppError::Deploy(_))));
    }
}
