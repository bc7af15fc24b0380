//! 分批规划 - 业务能力层
//!
//! 只根据姓名数量和输出类型决定是否分批、每批大小以及冷却节奏，
//! 不做任何 IO，相同输入总是得到相同计划

use crate::config::Config;
use crate::models::OutputKind;
use std::ops::Range;

/// 某种输出类型的分批参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    /// 超过该数量才分批
    pub threshold: usize,
    pub chunk_size: usize,
}

/// 分批计划
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub name_count: usize,
    pub chunk_size: usize,
    pub threshold: usize,
    /// 每执行多少批暂停一次
    pub cooldown_frequency: usize,
    pub total_chunks: usize,
}

impl BatchPlan {
    /// 是否一次请求完成
    pub fn is_single_shot(&self) -> bool {
        self.total_chunks == 1
    }

    /// 每一批在名单中的区间，连续、不重叠、升序
    pub fn chunks(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.total_chunks).map(move |i| {
            let start = i * self.chunk_size;
            let end = (start + self.chunk_size).min(self.name_count);
            start..end
        })
    }
}

/// 分批规划器
#[derive(Debug, Clone)]
pub struct BatchPlanner {
    document: ChunkLimits,
    archive: ChunkLimits,
    /// 远端服务每个窗口可承受的渲染次数
    render_ceiling: usize,
}

impl BatchPlanner {
    pub fn new(document: ChunkLimits, archive: ChunkLimits, render_ceiling: usize) -> Self {
        Self {
            document,
            archive,
            render_ceiling,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ChunkLimits {
                threshold: config.document_threshold,
                chunk_size: config.document_chunk_size,
            },
            ChunkLimits {
                threshold: config.archive_threshold,
                chunk_size: config.archive_chunk_size,
            },
            config.render_ceiling,
        )
    }

    /// 生成分批计划
    ///
    /// 空白证书不分批，返回 None
    pub fn plan(&self, name_count: usize, kind: OutputKind) -> Option<BatchPlan> {
        let limits = match kind {
            OutputKind::Document => self.document,
            OutputKind::Archive => self.archive,
            OutputKind::BlankBatch => return None,
        };

        let chunk_size = limits.chunk_size.max(1);
        let cooldown_frequency = (self.render_ceiling / chunk_size).max(1);

        if name_count <= limits.threshold {
            return Some(BatchPlan {
                name_count,
                chunk_size: name_count.max(1),
                threshold: limits.threshold,
                cooldown_frequency,
                total_chunks: 1,
            });
        }

        Some(BatchPlan {
            name_count,
            chunk_size,
            threshold: limits.threshold,
            cooldown_frequency,
            total_chunks: name_count.div_ceil(chunk_size),
        })
    }
}

impl Default for BatchPlanner {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
