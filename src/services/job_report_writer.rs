//! 任务报告写入服务 - 业务能力层
//!
//! 只负责把每个任务的结果追加到输出日志文件，不关心流程

use crate::error::FileError;
use std::io::Write;
use tracing::debug;

/// 任务报告写入服务
pub struct JobReportWriter {
    log_file_path: String,
}

impl JobReportWriter {
    pub fn new(log_file_path: impl Into<String>) -> Self {
        Self {
            log_file_path: log_file_path.into(),
        }
    }

    /// 写入文件头
    pub fn init(&self) -> Result<(), FileError> {
        let header = format!(
            "{}\n证书生成日志 - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        std::fs::write(&self.log_file_path, header)
            .map_err(|e| FileError::write(self.log_file_path.clone(), e))
    }

    /// 追加一条任务结果
    pub fn write(&self, job_index: usize, job_name: &str, outcome: &str) -> Result<(), FileError> {
        debug!("写入任务报告: 任务 {} | {}", job_index, job_name);

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .map_err(|e| FileError::write(self.log_file_path.clone(), e))?;

        let line = format!(
            "[{}] 任务 {} | {} | {}\n",
            chrono::Local::now().format("%H:%M:%S"),
            job_index,
            job_name,
            outcome
        );

        file.write_all(line.as_bytes())
            .map_err(|e| FileError::write(self.log_file_path.clone(), e))
    }
}
