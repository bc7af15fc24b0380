//! 成品写出服务 - 业务能力层
//!
//! 只负责把最终文件写到输出目录，每个任务写一次

use crate::error::FileError;
use crate::models::FinalArtifact;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// 成品写出服务
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 写出任务成品，返回文件路径
    ///
    /// 接收所有权，同一个成品不会被写出两次
    pub async fn deliver(&self, job_name: &str, artifact: FinalArtifact) -> Result<PathBuf, FileError> {
        let dir = self.output_dir.join(job_slug(job_name));
        let path = dir.join(&artifact.file_name);
        self.write_bytes(&path, &artifact.bytes).await?;
        Ok(path)
    }

    /// 写出历史记录合并结果
    pub async fn deliver_history(&self, bytes: &[u8]) -> Result<PathBuf, FileError> {
        let path = self.output_dir.join("History.pdf");
        self.write_bytes(&path, bytes).await?;
        Ok(path)
    }

    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<(), FileError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FileError::write(parent.display().to_string(), e))?;
        }

        debug!("写出文件: {} ({} 字节)", path.display(), bytes.len());
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| FileError::write(path.display().to_string(), e))
    }
}

static SLUG_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

/// 任务名转换为目录名
fn job_slug(job_name: &str) -> String {
    let slug = match SLUG_RE.get_or_init(|| Regex::new(r#"[\\/:*?"<>|\s]+"#)) {
        Ok(re) => re.replace_all(job_name.trim(), "_").to_string(),
        Err(_) => job_name.trim().to_string(),
    };
    let slug = slug.trim_matches(|c| c == '_' || c == '.').to_string();
    if slug.is_empty() {
        "job".to_string()
    } else {
        slug
    }
}
