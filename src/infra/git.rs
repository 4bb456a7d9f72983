use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::comparison::ComparisonRequest;
use crate::error::{AppError, AppResult};
use crate::services::VersionControlService;

pub struct GitCli {
    workspace_root: PathBuf,
}

impl GitCli {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl VersionControlService for GitCli {
    async fn produce_diff(&self, request: &ComparisonRequest) -> AppResult<String> {
        let args = request.diff_spec().git_args();
        debug!(?args, cwd = %self.workspace_root.display(), "running git");

        let output = Command::new("git")
            .args(&args)
            .current_dir(&self.workspace_root)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| AppError::VersionControl(format!("failed to run git: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            warn!(status = %output.status, "git diff failed");
            return Err(AppError::VersionControl(if stderr.is_empty() {
                format!("git {} exited with {}", args.join(" "), output.status)
            } else {
                format!("git {} exited with {}: {stderr}", args.join(" "), output.status)
            }));
        }

        let diff = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(bytes = diff.len(), "collected diff");
        Ok(diff)
    }
}
