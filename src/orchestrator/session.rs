//! 会话状态 - 编排层
//!
//! 持有整个会话共享的状态：
//! - 历史记录（只在更换模板时清空）
//! - 当前模板
//! - 任务进行中标记（同一时间只允许一个任务）

use crate::error::GenerationError;
use crate::services::HistoryLedger;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// 会话
#[derive(Debug, Default)]
pub struct Session {
    ledger: HistoryLedger,
    active_template: Option<PathBuf>,
    in_flight: Arc<AtomicBool>,
}

/// 任务进行中标记
///
/// 离开作用域时（成功或失败）自动恢复空闲状态
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        debug!("任务状态已恢复空闲");
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始一个任务
    ///
    /// 已有任务进行中时拒绝；模板与上一个任务不同时视为重新上传模板，清空历史记录
    pub fn begin_job(&mut self, template: Option<&Path>) -> Result<InFlightGuard, GenerationError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(GenerationError::JobInProgress);
        }

        if let Some(template) = template {
            let changed = self
                .active_template
                .as_deref()
                .is_some_and(|previous| previous != template);
            if changed {
                self.reset();
            }
            self.active_template = Some(template.to_path_buf());
        }

        Ok(InFlightGuard {
            flag: Arc::clone(&self.in_flight),
        })
    }

    /// 会话重置：清空历史记录
    pub fn reset(&mut self) {
        if !self.ledger.is_empty() {
            info!("🔄 模板已更换，清空 {} 条历史记录", self.ledger.len());
        }
        self.ledger.clear();
        self.active_template = None;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut HistoryLedger {
        &mut self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_job_rejected_while_in_flight() {
        let mut session = Session::new();
        let guard = session.begin_job(Some(Path::new("a.png"))).unwrap();
        assert!(session.is_busy());

        assert!(matches!(
            session.begin_job(Some(Path::new("a.png"))),
            Err(GenerationError::JobInProgress)
        ));

        drop(guard);
        assert!(!session.is_busy());
        assert!(session.begin_job(Some(Path::new("a.png"))).is_ok());
    }

    #[test]
    fn test_guard_restores_idle_on_error_path() {
        fn failing_job(session: &mut Session) -> Result<(), GenerationError> {
            let _guard = session.begin_job(None)?;
            Err(GenerationError::NoTemplate)
        }

        let mut session = Session::new();
        assert!(failing_job(&mut session).is_err());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_template_change_clears_history() {
        let mut session = Session::new();

        drop(session.begin_job(Some(Path::new("a.png"))).unwrap());
        session.ledger_mut().append("第一份", vec![1]);

        // 同一模板保留历史
        drop(session.begin_job(Some(Path::new("a.png"))).unwrap());
        assert_eq!(session.ledger().len(), 1);

        // 缺少模板的任务不会触发重置
        drop(session.begin_job(None).unwrap());
        assert_eq!(session.ledger().len(), 1);

        drop(session.begin_job(Some(Path::new("b.png"))).unwrap());
        assert!(session.ledger().is_empty());
    }
}
