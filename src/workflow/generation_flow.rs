//! 证书生成流程 - 流程层
//!
//! 核心职责：定义"一个任务"的完整处理流程
//!
//! 流程顺序：
//! 1. 检查模板（未选择模板时在任何网络请求之前失败）
//! 2. 校验任务参数
//! 3. 提取姓名 → 规划分批 → 依次执行（空白证书跳过前两步，一次请求）
//! 4. 合并各批结果
//! 5. PDF 结果写入会话历史记录

use std::time::Duration;

use tracing::{error, info};

use crate::clients::{NameExtractor, RenderService};
use crate::config::Config;
use crate::error::GenerationError;
use crate::models::{FinalArtifact, JobSpec, NameList, OutputKind, TemplateFile};
use crate::services::artifact_merger;
use crate::services::{BatchPlan, BatchPlanner, HistoryLedger};
use crate::workflow::batch_executor::{publish, BatchExecutor, JobStatus, StatusSender};
use crate::workflow::job_ctx::JobCtx;

/// 证书生成流程
///
/// - 编排单个任务的完整流程
/// - 持有远端服务能力，但不持有会话状态（历史记录由调用方传入）
pub struct GenerationFlow<R, E> {
    renderer: R,
    extractor: E,
    planner: BatchPlanner,
    cooldown: Duration,
}

impl<R: RenderService, E: NameExtractor> GenerationFlow<R, E> {
    pub fn new(renderer: R, extractor: E, config: &Config) -> Self {
        Self::with_planner(
            renderer,
            extractor,
            BatchPlanner::from_config(config),
            Duration::from_millis(config.cooldown_ms),
        )
    }

    pub fn with_planner(renderer: R, extractor: E, planner: BatchPlanner, cooldown: Duration) -> Self {
        Self {
            renderer,
            extractor,
            planner,
            cooldown,
        }
    }

    /// 执行一个生成任务
    ///
    /// 任何一步失败都会终止整个任务，不会产出部分结果
    pub async fn run(
        &self,
        job: &JobSpec,
        ctx: &JobCtx,
        ledger: &mut HistoryLedger,
        status: Option<&StatusSender>,
    ) -> Result<FinalArtifact, GenerationError> {
        let result = self.run_inner(job, ctx, ledger, status).await;

        match &result {
            Ok(artifact) => {
                info!("{} ✅ 生成完成: {} ({} 字节)", ctx, artifact.file_name, artifact.bytes.len());
                publish(status, JobStatus::Finished);
            }
            Err(e) => {
                error!("{} ❌ 生成失败: {}", ctx, e);
                publish(
                    status,
                    JobStatus::Failed {
                        message: e.to_string(),
                    },
                );
            }
        }

        result
    }

    async fn run_inner(
        &self,
        job: &JobSpec,
        ctx: &JobCtx,
        ledger: &mut HistoryLedger,
        status: Option<&StatusSender>,
    ) -> Result<FinalArtifact, GenerationError> {
        let template = TemplateFile::load(job.template.as_deref()).await?;
        job.validate()?;

        let options = job.render_options();
        let kind = job.output_format;
        let executor = BatchExecutor::new(&self.renderer, self.cooldown).with_status(status);

        let (partials, item_count) = match kind {
            OutputKind::BlankBatch => {
                let quantity = job.quantity.unwrap_or_default();
                let partials = executor.execute_blank(quantity, &template, &options).await?;
                (partials, quantity)
            }
            OutputKind::Document | OutputKind::Archive => {
                publish(status, JobStatus::Extracting);
                let names = self.extract_names(job).await?;
                info!("{} 📋 名单共 {} 人", ctx, names.len());

                let plan = self
                    .planner
                    .plan(names.len(), kind)
                    .ok_or_else(|| GenerationError::InvalidJob(format!("{} 不支持分批", kind)))?;
                log_plan(ctx, &plan);

                let partials = executor
                    .execute(&names, &template, &options, kind, &plan)
                    .await?;
                (partials, names.len())
            }
        };

        publish(
            status,
            JobStatus::Merging {
                parts: partials.len(),
            },
        );
        let artifact = artifact_merger::merge(partials, kind)?;

        if kind == OutputKind::Document {
            let position = ledger.append(ctx.history_label(item_count), artifact.bytes.clone());
            info!("{} 🗂️ 已加入历史记录 #{}", ctx, position + 1);
        }

        Ok(artifact)
    }

    /// 读取名单文件并交给提取服务
    async fn extract_names(&self, job: &JobSpec) -> Result<NameList, GenerationError> {
        let path = job
            .names_file
            .as_deref()
            .ok_or_else(|| GenerationError::InvalidJob("请指定姓名名单文件".to_string()))?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| crate::error::FileError::read(path.display().to_string(), e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "names.txt".to_string());

        let raw = self
            .extractor
            .extract_names(&file_name, bytes)
            .await
            .map_err(GenerationError::ExtractionFailure)?;

        NameList::new(raw)
    }
}

// ========== 日志辅助函数 ==========

fn log_plan(ctx: &JobCtx, plan: &BatchPlan) {
    if plan.is_single_shot() {
        info!("{} 🚀 {} 人不超过阈值 {}，一次生成", ctx, plan.name_count, plan.threshold);
    } else {
        info!(
            "{} 🧩 分 {} 批生成，每批 {} 人，每 {} 批冷却一次",
            ctx, plan.total_chunks, plan.chunk_size, plan.cooldown_frequency
        );
    }
}
