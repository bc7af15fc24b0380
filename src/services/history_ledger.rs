//! 会话历史记录 - 业务能力层
//!
//! 记录本次会话生成过的 PDF 文档，支持按位置删除和重新合并。
//! 只在会话重置（更换模板）时整体清空

use crate::error::MergeError;
use crate::services::artifact_merger::merge_documents;
use tracing::{debug, info, warn};

/// 一条历史记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHistoryEntry {
    pub display_name: String,
    pub artifact_bytes: Vec<u8>,
}

/// 会话历史记录
#[derive(Debug, Default)]
pub struct HistoryLedger {
    entries: Vec<SessionHistoryEntry>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条记录，返回其位置
    pub fn append(&mut self, display_name: impl Into<String>, artifact_bytes: Vec<u8>) -> usize {
        self.entries.push(SessionHistoryEntry {
            display_name: display_name.into(),
            artifact_bytes,
        });
        self.entries.len() - 1
    }

    /// 删除指定位置的记录，之后的记录前移
    pub fn remove(&mut self, index: usize) -> Option<SessionHistoryEntry> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    /// 清空全部记录（会话重置）
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[SessionHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 合并选中的记录
    ///
    /// 任一位置不存在都视为错误；调用方负责保证至少选中两条
    pub fn merge_entries(&self, indices: &[usize]) -> Result<Vec<u8>, MergeError> {
        let selected = indices
            .iter()
            .map(|&index| {
                self.entries
                    .get(index)
                    .map(|entry| entry.artifact_bytes.as_slice())
                    .ok_or(MergeError::MissingEntry { index })
            })
            .collect::<Result<Vec<&[u8]>, MergeError>>()?;
        merge_documents(&selected)
    }

    /// 会话结束时的合并
    ///
    /// 先按位置从大到小移除 exclude 中的记录，再合并剩余全部记录。
    /// 剩余不足两条时跳过，返回 None
    pub fn merge_remaining(&mut self, exclude: &[usize]) -> Result<Option<Vec<u8>>, MergeError> {
        let mut exclude = exclude.to_vec();
        exclude.sort_unstable();
        exclude.dedup();
        for &index in exclude.iter().rev() {
            match self.remove(index) {
                Some(entry) => info!("🗑️ 已从历史记录中移除: {}", entry.display_name),
                None => warn!("⚠️ 历史记录中没有第 {} 条，忽略", index + 1),
            }
        }

        if self.len() < 2 {
            warn!("⚠️ 历史记录少于 2 条（当前 {} 条），跳过合并", self.len());
            return Ok(None);
        }

        info!("📚 正在合并 {} 条历史记录...", self.len());
        for (i, entry) in self.entries.iter().enumerate() {
            debug!("  {}. {}", i + 1, entry.display_name);
        }

        let all: Vec<usize> = (0..self.len()).collect();
        self.merge_entries(&all).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_remove_shift_entries() {
        let mut ledger = HistoryLedger::new();
        assert_eq!(ledger.append("a", vec![1]), 0);
        assert_eq!(ledger.append("b", vec![2]), 1);
        assert_eq!(ledger.append("c", vec![3]), 2);

        let removed = ledger.remove(1).unwrap();
        assert_eq!(removed.display_name, "b");

        let names: Vec<&str> = ledger
            .entries()
            .iter()
            .map(|e| e.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!(ledger.remove(5).is_none());
    }

    #[test]
    fn test_clear_empties_ledger() {
        let mut ledger = HistoryLedger::new();
        ledger.append("a", vec![1]);
        ledger.clear();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_merge_with_no_selection_is_empty_error() {
        let ledger = HistoryLedger::new();
        assert!(matches!(ledger.merge_entries(&[]), Err(MergeError::Empty)));
    }

    fn one_page_pdf(width: i64) -> Vec<u8> {
        use lopdf::{dictionary, Document, Object, Stream};
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), 595.into()],
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

    fn page_widths(bytes: &[u8]) -> Vec<i64> {
        use lopdf::{Document, Object};
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|id| {
                let page = doc.get_object(*id).and_then(Object::as_dict).unwrap();
                page.get(b"MediaBox").and_then(Object::as_array).unwrap()[2]
                    .as_i64()
                    .unwrap()
            })
            .collect()
    }

    fn ledger_with(widths: &[i64]) -> HistoryLedger {
        let mut ledger = HistoryLedger::new();
        for (i, &width) in widths.iter().enumerate() {
            ledger.append(format!("第{}份", i + 1), one_page_pdf(width));
        }
        ledger
    }

    #[test]
    fn test_merge_with_missing_index_fails() {
        let ledger = ledger_with(&[100, 200]);
        assert!(matches!(
            ledger.merge_entries(&[0, 7]),
            Err(MergeError::MissingEntry { index: 7 })
        ));
    }

    #[test]
    fn test_merge_non_contiguous_selection_keeps_order() {
        let ledger = ledger_with(&[100, 200, 300]);
        let merged = ledger.merge_entries(&[2, 0]).unwrap();
        assert_eq!(page_widths(&merged), vec![300, 100]);
    }

    #[test]
    fn test_merge_remaining_removes_exclusions_highest_first() {
        let mut ledger = ledger_with(&[100, 200, 300, 400]);

        // 乱序、重复、越界都应被正确处理
        let merged = ledger.merge_remaining(&[2, 0, 2, 9]).unwrap().unwrap();

        assert_eq!(page_widths(&merged), vec![200, 400]);
        let names: Vec<&str> = ledger
            .entries()
            .iter()
            .map(|e| e.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["第2份", "第4份"]);
    }

    #[test]
    fn test_merge_remaining_skips_when_fewer_than_two_left() {
        let mut ledger = ledger_with(&[100, 200]);
        assert!(ledger.merge_remaining(&[1]).unwrap().is_none());
        assert_eq!(ledger.len(), 1);

        let mut empty = HistoryLedger::new();
        assert!(empty.merge_remaining(&[]).unwrap().is_none());
    }
}
