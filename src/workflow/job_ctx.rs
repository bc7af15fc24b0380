//! 任务处理上下文
//!
//! 封装"我正在处理第几个任务、叫什么名字"这一信息

use std::fmt::Display;

/// 任务处理上下文
#[derive(Debug, Clone)]
pub struct JobCtx {
    /// 任务序号（从 1 开始，仅用于日志显示）
    pub job_index: usize,

    /// 任务名称
    pub job_name: String,
}

impl JobCtx {
    pub fn new(job_index: usize, job_name: impl Into<String>) -> Self {
        Self {
            job_index,
            job_name: job_name.into(),
        }
    }

    /// 历史记录中显示的名称
    pub fn history_label(&self, count: usize) -> String {
        format!(
            "{} ({} 份) · {}",
            self.job_name,
            count,
            chrono::Local::now().format("%H:%M:%S")
        )
    }
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[任务 {} {}]", self.job_index, self.job_name)
    }
}
