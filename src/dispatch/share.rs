use log::{debug, warn};
use std::future::Future;
use std::path::Path;
use tokio::process::Command;

use crate::error::DispatchError;

/// Native share interface. Resolves once the interaction is dismissed.
pub trait ShareSheet: Send + Sync {
    fn share(&self, file: &Path) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

/// Share sheet backed by an external program, run as `command [args..] <file>`
#[derive(Debug, Clone)]
pub struct CommandShareSheet {
    command: String,
    args: Vec<String>,
}

impl CommandShareSheet {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl ShareSheet for CommandShareSheet {
    async fn share(&self, file: &Path) -> Result<(), DispatchError> {
        debug!("share: {} {:?} {}", self.command, self.args, file.display());

        let status = Command::new(&self.command)
            .args(&self.args)
            .arg(file)
            .status()
            .await
            .map_err(|e| {
                warn!("share: failed to spawn {}: {}", self.command, e);
                DispatchError::Share(format!("failed to run {}: {}", self.command, e))
            })?;

        if !status.success() {
            warn!("share: {} exited with {}", self.command, status);
            return Err(DispatchError::Share(format!(
                "{} exited with {}",
                self.command, status
            )));
        }
        Ok(())
    }
}
