pub mod artifact;
pub mod job;
pub mod loaders;
pub mod name_list;
pub mod output;
pub mod render;

pub use artifact::{FinalArtifact, PartialArtifact};
pub use job::JobSpec;
pub use loaders::{load_all_job_files, load_job_file};
pub use name_list::NameList;
pub use output::OutputKind;
pub use render::{FieldRect, RenderOptions, RenderRequest, TemplateFile};
