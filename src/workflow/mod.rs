pub mod batch_executor;
pub mod generation_flow;
pub mod job_ctx;

pub use batch_executor::{BatchExecutor, CooldownPolicy, JobStatus, StatusSender};
pub use generation_flow::GenerationFlow;
pub use job_ctx::JobCtx;
