pub mod artifact_merger;
pub mod artifact_writer;
pub mod batch_planner;
pub mod history_ledger;
pub mod job_report_writer;

pub use artifact_writer::ArtifactWriter;
pub use batch_planner::{BatchPlan, BatchPlanner, ChunkLimits};
pub use history_ledger::{HistoryLedger, SessionHistoryEntry};
pub use job_report_writer::JobReportWriter;
