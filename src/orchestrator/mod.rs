//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量任务的调度和会话状态，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量任务处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载任务（Vec<JobSpec>）
//! - 交付成品、写任务报告
//! - 会话结束时合并历史文档
//! - 输出全局统计信息
//!
//! ### `session` - 会话状态
//! - 同一时间只允许一个任务（进行中标记）
//! - 更换模板时清空历史记录
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<JobSpec>)
//!     ↓
//! workflow::GenerationFlow (处理单个任务)
//!     ↓
//! workflow::BatchExecutor (处理单个任务的各批)
//!     ↓
//! services (能力层：planner / merger / ledger / writer)
//!     ↓
//! clients (远端服务：render / extract)
//! ```

pub mod batch_processor;
pub mod session;

// 重新导出主要类型
pub use batch_processor::App;
pub use session::{InFlightGuard, Session};
