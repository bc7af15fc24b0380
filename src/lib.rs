//! # Certihub Batch
//!
//! 批量生成证书的 Rust 应用程序：读取名单，按批调用远端渲染服务，合并为一份 PDF 或 ZIP
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 远端服务层（Clients）
//! - `clients/` - 渲染服务和姓名提取服务，只暴露能力
//! - `RenderService` / `NameExtractor` - 上层依赖的 trait
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `BatchPlanner` - 分批规划
//! - `artifact_merger` - PDF / ZIP 合并
//! - `HistoryLedger` - 会话历史记录
//! - `ArtifactWriter` / `JobReportWriter` - 写成品、写报告
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个任务"的完整处理流程
//! - `BatchExecutor` - 单 worker 队列，带冷却
//! - `GenerationFlow` - 流程编排（提取 → 分批 → 渲染 → 合并 → 记录）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量任务处理器
//! - `orchestrator/session` - 会话状态
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, GenerationError};
pub use models::{JobSpec, OutputKind};
pub use orchestrator::{App, Session};
pub use workflow::{GenerationFlow, JobCtx, JobStatus};
