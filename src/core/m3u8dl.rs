use std::path::{Path, PathBuf};

use anyhow::anyhow;
use async_trait::async_trait;

use crate::platforms::traits::{MediaTool, ToolOutput};

/// N_m3u8DL-RE invoked as a child process, output captured.
pub struct M3u8Dl {
    bin: PathBuf,
}

impl M3u8Dl {
    pub fn new(bin: PathBuf) -> Self {
        Self { bin }
    }
}

#[async_trait]
impl MediaTool for M3u8Dl {
    async fn run(&self, args: &[String]) -> anyhow::Result<ToolOutput> {
        tracing::debug!("[m3u8dl] {} {}", self.bin.display(), args.join(" "));

        let output = crate::core::process::command(&self.bin)
            .args(args)
            .output()
            .await
            .map_err(|e| anyhow!("Failed to start {}: {}", self.bin.display(), e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(anyhow!(
                "{} exited with {}: {}",
                self.bin.display(),
                output.status,
                last_line(&stderr).or_else(|| last_line(&stdout)).unwrap_or("")
            ));
        }

        Ok(ToolOutput { stdout, stderr })
    }
}

fn last_line(s: &str) -> Option<&str> {
    s.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

pub fn video_args(
    manifest_url: &str,
    max_height: u32,
    codec: &str,
    save_dir: &Path,
    save_name: &str,
) -> Vec<String> {
    let mut args = vec![
        "-sv".to_string(),
        format!("res={}*:codec={}:for=best", max_height, codec),
        manifest_url.to_string(),
    ];
    push_save_target(&mut args, save_dir, save_name);
    args
}

pub fn subtitle_args(
    manifest_url: &str,
    lang: &str,
    format: &str,
    save_dir: &Path,
    save_name: &str,
) -> Vec<String> {
    let mut args = vec![
        "--auto-subtitle-fix".to_string(),
        "--sub-format".to_string(),
        format.to_string(),
        "--select-subtitle".to_string(),
        format!("lang={}:for=all", lang),
        manifest_url.to_string(),
    ];
    push_save_target(&mut args, save_dir, save_name);
    args
}

fn push_save_target(args: &mut Vec<String>, save_dir: &Path, save_name: &str) {
    args.extend([
        "--save-dir".to_string(),
        save_dir.to_string_lossy().to_string(),
        "--save-name".to_string(),
        save_name.to_string(),
    ]);
}
