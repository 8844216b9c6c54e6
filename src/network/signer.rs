// * Signature Provider
// * The anti-bot token is computed by an external JS routine; this module
// * treats it as an opaque, injectable strategy. The client never retries a
// * failed signature call - failures propagate to the caller.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signature process failed to start: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("signature process exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },

    #[error("signature process produced no token")]
    EmptyToken,
}

// * Opaque signature strategy: (uri, canonical query, user agent) -> token.
// * Injected into the client at construction time so the browserless and
// * browser-backed variants can differ only in where the token comes from.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(
        &self,
        uri: &str,
        query: &str,
        user_agent: &str,
    ) -> Result<String, SignatureError>;
}

// * Production signer: shells out to the bundled JS signature script via
// * node and reads the token from stdout.
pub struct NodeSigner {
    script: PathBuf,
}

impl NodeSigner {
    pub fn new(script: PathBuf) -> Self {
        Self { script }
    }
}

#[async_trait]
impl Signer for NodeSigner {
    async fn sign(
        &self,
        uri: &str,
        query: &str,
        user_agent: &str,
    ) -> Result<String, SignatureError> {
        let output = Command::new("node")
            .arg(&self.script)
            .arg(uri)
            .arg(query)
            .arg(user_agent)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(SignatureError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(SignatureError::EmptyToken);
        }

        debug!(uri, token_len = token.len(), "signature token computed");
        Ok(token)
    }
}
