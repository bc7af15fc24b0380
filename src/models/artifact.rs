use crate::models::output::OutputKind;

/// 单个批次的渲染结果
///
/// 只在执行器和合并器之间传递，合并后即被丢弃
#[derive(Debug, Clone)]
pub struct PartialArtifact {
    /// 批次序号（从 0 开始）
    pub index: usize,
    pub kind: OutputKind,
    pub bytes: Vec<u8>,
}

/// 一次生成任务最终交付给用户的文件
#[derive(Debug, Clone)]
pub struct FinalArtifact {
    pub kind: OutputKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FinalArtifact {
    pub fn new(kind: OutputKind, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            file_name: kind.file_name().to_string(),
            bytes,
        }
    }
}
