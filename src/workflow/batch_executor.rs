//! 批次执行器 - 流程层
//!
//! ## 职责
//!
//! 按分批计划依次调用渲染服务，收集每一批的结果。
//!
//! ## 执行纪律
//!
//! - **单 worker 队列**：任务队列只有一个消费者，第 i+1 批在第 i 批返回后才发出
//! - **冷却**：由 `CooldownPolicy` 决定在哪些批次之后暂停
//! - **失败即终止**：任意一批失败，已完成的批次全部丢弃，不重试
//! - **进度可见**：每批开始/完成、冷却都会发布 `JobStatus`

use crate::clients::RenderService;
use crate::error::GenerationError;
use crate::models::{NameList, OutputKind, PartialArtifact, RenderOptions, RenderRequest, TemplateFile};
use crate::services::BatchPlan;
use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// 对调用方可见的任务状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// 正在提取姓名
    Extracting,
    /// 第 chunk 批开始（从 1 开始）
    Rendering { chunk: usize, total: usize },
    /// 第 chunk 批完成（从 1 开始）
    BatchDone { chunk: usize, total: usize },
    /// 第 after_chunk 批之后冷却（从 0 开始）
    CoolingDown { after_chunk: usize, pause: Duration },
    /// 正在合并
    Merging { parts: usize },
    Finished,
    Failed { message: String },
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Extracting => write!(f, "正在读取名单..."),
            JobStatus::Rendering { chunk, total } => write!(f, "正在生成第 {}/{} 批", chunk, total),
            JobStatus::BatchDone { chunk, total } => write!(f, "第 {}/{} 批完成", chunk, total),
            JobStatus::CoolingDown { pause, .. } => {
                write!(f, "冷却中，{:.1} 秒后继续...", pause.as_secs_f64())
            }
            JobStatus::Merging { parts } => write!(f, "正在合并 {} 份结果...", parts),
            JobStatus::Finished => write!(f, "生成完成"),
            JobStatus::Failed { message } => write!(f, "生成失败: {}", message),
        }
    }
}

/// 状态发布通道
pub type StatusSender = UnboundedSender<JobStatus>;

/// 发布状态，接收端已关闭时忽略
pub(crate) fn publish(status: Option<&StatusSender>, value: JobStatus) {
    if let Some(tx) = status {
        let _ = tx.send(value);
    }
}

/// 冷却策略：每完成 frequency 批暂停一次，最后一批之后不暂停
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    frequency: usize,
    pause: Duration,
}

impl CooldownPolicy {
    pub fn new(frequency: usize, pause: Duration) -> Self {
        Self {
            frequency: frequency.max(1),
            pause,
        }
    }

    /// 第 chunk_index 批（从 0 开始）完成后需要暂停多久
    pub fn pause_after(&self, chunk_index: usize, total_chunks: usize) -> Option<Duration> {
        let is_last = chunk_index + 1 >= total_chunks;
        if !is_last && (chunk_index + 1) % self.frequency == 0 {
            Some(self.pause)
        } else {
            None
        }
    }
}

/// 队列中的一批任务
#[derive(Debug, Clone)]
struct BatchTask {
    index: usize,
    range: Range<usize>,
}

/// 批次执行器
pub struct BatchExecutor<'a, R> {
    renderer: &'a R,
    pause: Duration,
    status: Option<&'a StatusSender>,
}

impl<'a, R: RenderService> BatchExecutor<'a, R> {
    pub fn new(renderer: &'a R, pause: Duration) -> Self {
        Self {
            renderer,
            pause,
            status: None,
        }
    }

    /// 发布进度到指定通道
    pub fn with_status(mut self, status: Option<&'a StatusSender>) -> Self {
        self.status = status;
        self
    }

    /// 按计划依次执行所有批次
    ///
    /// 返回按批次序号升序排列的结果
    pub async fn execute(
        &self,
        names: &NameList,
        template: &TemplateFile,
        options: &RenderOptions,
        kind: OutputKind,
        plan: &BatchPlan,
    ) -> Result<Vec<PartialArtifact>, GenerationError> {
        if plan.name_count != names.len() {
            return Err(GenerationError::InvalidJob(format!(
                "分批计划按 {} 人生成，名单实际 {} 人",
                plan.name_count,
                names.len()
            )));
        }

        let policy = CooldownPolicy::new(plan.cooldown_frequency, self.pause);
        let total = plan.total_chunks;
        let mut queue: VecDeque<BatchTask> = plan
            .chunks()
            .enumerate()
            .map(|(index, range)| BatchTask { index, range })
            .collect();
        let mut partials: Vec<PartialArtifact> = Vec::with_capacity(total);

        while let Some(task) = queue.pop_front() {
            let chunk_names = names.chunk(task.range.clone()).ok_or_else(|| {
                GenerationError::InvalidJob(format!("第 {} 批超出名单范围", task.index + 1))
            })?;
            log_batch_start(task.index, total, &task.range, names.len());
            publish(
                self.status,
                JobStatus::Rendering {
                    chunk: task.index + 1,
                    total,
                },
            );

            let request = RenderRequest {
                template,
                names: Some(chunk_names),
                start_index: task.range.start,
                options,
                kind,
                quantity: None,
            };

            let bytes = match self.renderer.render_batch(request).await {
                Ok(bytes) => bytes,
                Err(cause) => {
                    warn!(
                        "❌ 第 {}/{} 批失败，丢弃已完成的 {} 批结果",
                        task.index + 1,
                        total,
                        partials.len()
                    );
                    return Err(GenerationError::BatchFailure {
                        chunk_index: task.index,
                        cause,
                    });
                }
            };

            debug!("第 {} 批返回 {} 字节", task.index + 1, bytes.len());
            partials.push(PartialArtifact {
                index: task.index,
                kind,
                bytes,
            });
            publish(
                self.status,
                JobStatus::BatchDone {
                    chunk: task.index + 1,
                    total,
                },
            );

            if let Some(pause) = policy.pause_after(task.index, total) {
                info!("⏳ 已完成 {} 批，冷却 {:.1} 秒", task.index + 1, pause.as_secs_f64());
                publish(
                    self.status,
                    JobStatus::CoolingDown {
                        after_chunk: task.index,
                        pause,
                    },
                );
                sleep(pause).await;
            }
        }

        Ok(partials)
    }

    /// 空白证书：不分批，一次请求指定数量
    pub async fn execute_blank(
        &self,
        quantity: usize,
        template: &TemplateFile,
        options: &RenderOptions,
    ) -> Result<Vec<PartialArtifact>, GenerationError> {
        info!("📦 生成 {} 张空白证书", quantity);
        publish(self.status, JobStatus::Rendering { chunk: 1, total: 1 });

        let request = RenderRequest {
            template,
            names: None,
            start_index: 0,
            options,
            kind: OutputKind::BlankBatch,
            quantity: Some(quantity),
        };

        let bytes = self
            .renderer
            .render_batch(request)
            .await
            .map_err(|cause| GenerationError::BatchFailure {
                chunk_index: 0,
                cause,
            })?;

        publish(self.status, JobStatus::BatchDone { chunk: 1, total: 1 });
        Ok(vec![PartialArtifact {
            index: 0,
            kind: OutputKind::BlankBatch,
            bytes,
        }])
    }
}

// ========== 日志辅助函数 ==========

fn log_batch_start(index: usize, total: usize, range: &Range<usize>, name_count: usize) {
    info!("📦 开始生成第 {}/{} 批", index + 1, total);
    info!("📄 本批姓名: {}-{} / 共 {} 个", range.start + 1, range.end, name_count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::FieldRect;
    use crate::services::BatchPlanner;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    /// 记录调用并可在指定批次失败的渲染服务
    struct FakeRenderer {
        fail_at_start: Option<usize>,
        calls: Mutex<Vec<(usize, usize, Option<usize>)>>,
    }

    impl FakeRenderer {
        fn new(fail_at_start: Option<usize>) -> Self {
            Self {
                fail_at_start,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(usize, usize, Option<usize>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RenderService for FakeRenderer {
        async fn render_batch(&self, request: RenderRequest<'_>) -> Result<Vec<u8>, ApiError> {
            let count = request.names.map_or(0, |n| n.len());
            self.calls
                .lock()
                .unwrap()
                .push((request.start_index, count, request.quantity));

            if self.fail_at_start == Some(request.start_index) {
                return Err(ApiError::BadStatus {
                    endpoint: "/generate".to_string(),
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(format!("batch@{}", request.start_index).into_bytes())
        }
    }

    fn template() -> TemplateFile {
        TemplateFile {
            file_name: "tpl.png".to_string(),
            bytes: vec![0u8; 4],
        }
    }

    fn options() -> RenderOptions {
        RenderOptions {
            font_family: "Poppins.ttf".to_string(),
            font_size: 40,
            font_color: "#000000".to_string(),
            field_rect: FieldRect::from_array([0.0, 0.0, 100.0, 40.0]),
        }
    }

    fn names(n: usize) -> NameList {
        NameList::new((0..n).map(|i| format!("name-{}", i))).unwrap()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<JobStatus>) -> Vec<JobStatus> {
        let mut out = Vec::new();
        while let Ok(status) = rx.try_recv() {
            out.push(status);
        }
        out
    }

    #[test]
    fn test_cooldown_policy_skips_last_chunk() {
        let policy = CooldownPolicy::new(2, Duration::from_millis(1500));
        let pauses: Vec<bool> = (0..4).map(|i| policy.pause_after(i, 4).is_some()).collect();
        assert_eq!(pauses, vec![false, true, false, false]);

        // 总批数恰好是频率的整数倍时，最后一批之后也不冷却
        let pauses: Vec<bool> = (0..6).map(|i| policy.pause_after(i, 6).is_some()).collect();
        assert_eq!(pauses, vec![false, true, false, true, false, false]);
    }

    #[test]
    fn test_cooldown_policy_zero_frequency_is_one() {
        let policy = CooldownPolicy::new(0, Duration::from_secs(1));
        assert!(policy.pause_after(0, 3).is_some());
        assert!(policy.pause_after(2, 3).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_four_chunks_cool_down_after_second_only() {
        let renderer = FakeRenderer::new(None);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let executor = BatchExecutor::new(&renderer, Duration::from_millis(1500)).with_status(Some(&tx));

        let plan = BatchPlanner::default().plan(200, OutputKind::Document).unwrap();
        assert_eq!(plan.total_chunks, 4);

        let started = Instant::now();
        let partials = executor
            .execute(&names(200), &template(), &options(), OutputKind::Document, &plan)
            .await
            .unwrap();

        // 只冷却一次
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1500), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(3000), "{:?}", elapsed);
        assert_eq!(
            partials.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
        assert_eq!(
            renderer.calls(),
            vec![(0, 50, None), (50, 50, None), (100, 50, None), (150, 50, None)]
        );

        let cooldowns: Vec<usize> = drain(&mut rx)
            .into_iter()
            .filter_map(|s| match s {
                JobStatus::CoolingDown { after_chunk, .. } => Some(after_chunk),
                _ => None,
            })
            .collect();
        assert_eq!(cooldowns, vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_discards_completed_batches() {
        // 5 批，第 3 批（index 2）失败
        let planner = BatchPlanner::default();
        let plan = planner.plan(250, OutputKind::Document).unwrap();
        assert_eq!(plan.total_chunks, 5);

        let renderer = FakeRenderer::new(Some(100));
        let executor = BatchExecutor::new(&renderer, Duration::from_millis(1500));

        let result = executor
            .execute(&names(250), &template(), &options(), OutputKind::Document, &plan)
            .await;

        match result {
            Err(GenerationError::BatchFailure { chunk_index, .. }) => assert_eq!(chunk_index, 2),
            other => panic!("unexpected: {:?}", other.map(|p| p.len())),
        }
        // 失败后不再发出后续请求
        assert_eq!(renderer.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_plan_for_other_name_count_is_rejected() {
        let renderer = FakeRenderer::new(None);
        let executor = BatchExecutor::new(&renderer, Duration::from_millis(1500));

        // 按 200 人规划，实际只有 120 人
        let plan = BatchPlanner::default().plan(200, OutputKind::Document).unwrap();
        let result = executor
            .execute(&names(120), &template(), &options(), OutputKind::Document, &plan)
            .await;

        assert!(matches!(result, Err(GenerationError::InvalidJob(_))));
        assert!(renderer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_single_shot_has_no_cooldown() {
        let renderer = FakeRenderer::new(None);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let executor = BatchExecutor::new(&renderer, Duration::from_secs(60)).with_status(Some(&tx));

        let plan = BatchPlanner::default().plan(30, OutputKind::Archive).unwrap();
        let partials = executor
            .execute(&names(30), &template(), &options(), OutputKind::Archive, &plan)
            .await
            .unwrap();

        assert_eq!(partials.len(), 1);
        assert_eq!(renderer.calls(), vec![(0, 30, None)]);
        assert!(!drain(&mut rx)
            .iter()
            .any(|s| matches!(s, JobStatus::CoolingDown { .. })));
    }

    #[tokio::test]
    async fn test_blank_batch_is_one_call_with_quantity() {
        let renderer = FakeRenderer::new(None);
        let executor = BatchExecutor::new(&renderer, Duration::from_secs(1));

        let partials = executor.execute_blank(500, &template(), &options()).await.unwrap();
        assert_eq!(partials.len(), 1);
        assert_eq!(partials[0].kind, OutputKind::BlankBatch);
        assert_eq!(renderer.calls(), vec![(0, 0, Some(500))]);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(
            JobStatus::Rendering { chunk: 2, total: 4 }.to_string(),
            "正在生成第 2/4 批"
        );
        assert!(JobStatus::CoolingDown {
            after_chunk: 1,
            pause: Duration::from_millis(1500)
        }
        .to_string()
        .contains("1.5"));
    }
}
