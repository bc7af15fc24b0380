//! 批量任务处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量证书任务的调度和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、初始化任务报告、创建 HTTP 客户端
//! 2. **批量加载**：扫描并加载所有任务文件（`Vec<JobSpec>`）
//! 3. **逐个执行**：同一时间只有一个任务在生成，每个任务的进度通过状态通道输出
//! 4. **结果交付**：写入输出目录并记录任务报告
//! 5. **历史合并**：全部任务结束后合并本次会话的 PDF 历史
//! 6. **全局统计**：汇总所有任务的处理结果

use crate::clients::{ExtractClient, RenderClient};
use crate::config::Config;
use crate::error::{AppError, AppResult, GenerationError};
use crate::models::{FinalArtifact, JobSpec};
use crate::orchestrator::session::Session;
use crate::services::{ArtifactWriter, JobReportWriter};
use crate::workflow::{GenerationFlow, JobCtx, JobStatus};
use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    flow: GenerationFlow<RenderClient, ExtractClient>,
    writer: ArtifactWriter,
    report: JobReportWriter,
    session: Session,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        config.validate()?;

        let report = JobReportWriter::new(config.output_log_file.clone());
        report.init()?;

        log_startup(&config);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(AppError::HttpClient)?;

        let flow = GenerationFlow::new(
            RenderClient::new(&config, http.clone()),
            ExtractClient::new(&config, http),
            &config,
        );

        Ok(Self {
            writer: ArtifactWriter::new(&config.output_dir),
            flow,
            report,
            session: Session::new(),
            config,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<()> {
        let jobs = self.load_jobs().await?;

        if jobs.is_empty() {
            warn!("⚠️ 没有找到待处理的任务文件，程序结束");
            return Ok(());
        }

        info!("✓ 找到 {} 个待处理的任务", jobs.len());
        info!("💡 任务依次执行，同一时间只生成一个\n");

        let mut stats = ProcessingStats {
            total: jobs.len(),
            ..Default::default()
        };

        for (idx, job) in jobs.iter().enumerate() {
            let ctx = JobCtx::new(idx + 1, job.name.clone());
            log_job_start(&ctx, job);

            let outcome = match self.process_job(job, &ctx).await {
                Ok(path) => {
                    stats.success += 1;
                    info!("{} 📁 已保存至: {}", ctx, path.display());
                    format!("成功 -> {}", path.display())
                }
                Err(e) => {
                    stats.failed += 1;
                    format!("失败: {}", e)
                }
            };

            if let Err(e) = self.report.write(ctx.job_index, &ctx.job_name, &outcome) {
                error!("{} 写入任务报告失败: {}", ctx, e);
            }
        }

        if self.config.merge_history {
            if let Err(e) = self.merge_history().await {
                error!("❌ 历史记录合并失败: {}", e);
            }
        }

        print_final_stats(&stats, &self.config);

        Ok(())
    }

    /// 加载任务
    async fn load_jobs(&self) -> AppResult<Vec<JobSpec>> {
        info!("\n📁 正在扫描待处理的任务...");
        Ok(crate::models::load_all_job_files(&self.config.job_folder).await?)
    }

    /// 处理单个任务：生成并交付
    async fn process_job(&mut self, job: &JobSpec, ctx: &JobCtx) -> Result<std::path::PathBuf, GenerationError> {
        let _guard = self.session.begin_job(job.template.as_deref())?;

        let (tx, rx) = mpsc::unbounded_channel();
        let progress = tokio::spawn(log_progress(ctx.clone(), rx));

        let result = self
            .flow
            .run(job, ctx, self.session.ledger_mut(), Some(&tx))
            .await;

        // 关闭通道，等待进度日志输出完毕
        drop(tx);
        if let Err(e) = progress.await {
            debug!("{} 进度日志任务异常退出: {}", ctx, e);
        }

        let artifact: FinalArtifact = result?;
        Ok(self.writer.deliver(&job.name, artifact).await?)
    }

    /// 合并本次会话的历史文档，写出 History.pdf
    async fn merge_history(&mut self) -> AppResult<()> {
        let merged = self
            .session
            .ledger_mut()
            .merge_remaining(&self.config.history_merge_exclude)
            .map_err(GenerationError::from)?;

        if let Some(bytes) = merged {
            let path = self.writer.deliver_history(&bytes).await?;
            info!("✅ 历史记录已合并至: {}", path.display());
        }

        Ok(())
    }
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}

/// 输出单个任务的进度
async fn log_progress(ctx: JobCtx, mut rx: mpsc::UnboundedReceiver<JobStatus>) {
    while let Some(status) = rx.recv().await {
        match status {
            JobStatus::Finished | JobStatus::Failed { .. } => debug!("{} {}", ctx, status),
            _ => info!("{} ⏳ {}", ctx, status),
        }
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量证书生成模式");
    info!("🌐 服务地址: {}", config.service_base_url);
    info!(
        "📦 PDF 分批: 超过 {} 人每批 {} 人 | ZIP 分批: 超过 {} 人每批 {} 人",
        config.document_threshold,
        config.document_chunk_size,
        config.archive_threshold,
        config.archive_chunk_size
    );
    info!(
        "⏱️ 渲染上限 {} 次 / 冷却 {} 毫秒",
        config.render_ceiling, config.cooldown_ms
    );
    info!("{}", "=".repeat(60));
}

fn log_job_start(ctx: &JobCtx, job: &JobSpec) {
    info!("\n{}", "=".repeat(60));
    info!("📄 开始任务 {}: {}", ctx.job_index, ctx.job_name);
    info!("🎨 输出格式: {}", job.output_format);
    info!("{}", "=".repeat(60));
}

fn print_final_stats(stats: &ProcessingStats, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", stats.success, stats.total);
    info!("❌ 失败: {}", stats.failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", config.output_log_file);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config_in(dir: &Path) -> Config {
        Config {
            job_folder: dir.join("jobs").to_string_lossy().to_string(),
            output_dir: dir.join("output").to_string_lossy().to_string(),
            output_log_file: dir.join("output.txt").to_string_lossy().to_string(),
            ..Config::default()
        }
    }

    fn one_page_pdf() -> Vec<u8> {
        use lopdf::{dictionary, Document, Object, Stream};
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 842.into(), 595.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1_i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            document_chunk_size: 0,
            ..config_in(dir.path())
        };

        let result = App::initialize(config).await;
        assert!(matches!(result, Err(AppError::Config(_))));
        // 配置错误时不写任务报告
        assert!(!dir.path().join("output.txt").exists());
    }

    #[tokio::test]
    async fn test_empty_job_folder_finishes_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("jobs")).unwrap();

        let mut app = App::initialize(config_in(dir.path())).await.unwrap();
        app.run().await.unwrap();

        let report = std::fs::read_to_string(dir.path().join("output.txt")).unwrap();
        assert!(report.contains("证书生成日志"));
    }

    #[tokio::test]
    async fn test_missing_job_folder_is_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::initialize(config_in(dir.path())).await.unwrap();

        assert!(matches!(app.load_jobs().await, Err(AppError::File(_))));
    }

    #[tokio::test]
    async fn test_session_end_merge_writes_history_without_excluded_entries() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            history_merge_exclude: vec![1],
            ..config_in(dir.path())
        };
        let mut app = App::initialize(config).await.unwrap();
        for name in ["春季", "夏季", "秋季"] {
            app.session.ledger_mut().append(name, one_page_pdf());
        }

        app.merge_history().await.unwrap();

        let bytes = std::fs::read(dir.path().join("output").join("History.pdf")).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[tokio::test]
    async fn test_session_end_merge_skips_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::initialize(config_in(dir.path())).await.unwrap();
        app.session.ledger_mut().append("唯一", one_page_pdf());

        app.merge_history().await.unwrap();

        assert!(!dir.path().join("output").join("History.pdf").exists());
    }
}
