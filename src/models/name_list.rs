use crate::error::GenerationError;
use std::ops::Range;

/// 姓名名单
///
/// 顺序即最终证书的顺序；创建后不可修改，且至少包含一个姓名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameList(Vec<String>);

impl NameList {
    /// 从原始字符串构建名单，去除首尾空白并丢弃空行
    pub fn new<I, S>(raw: I) -> Result<Self, GenerationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = raw
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        if names.is_empty() {
            return Err(GenerationError::NoNamesFound);
        }

        Ok(Self(names))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// 取出某一批的姓名，越界时返回 None
    pub fn chunk(&self, range: Range<usize>) -> Option<&[String]> {
        self.0.get(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_entries_are_dropped() {
        let names = NameList::new(["  张三 ", "", "   ", "李四"]).unwrap();
        assert_eq!(names.as_slice(), &["张三".to_string(), "李四".to_string()]);
    }

    #[test]
    fn test_empty_list_is_no_names_found() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(
            NameList::new(empty),
            Err(GenerationError::NoNamesFound)
        ));
        assert!(matches!(
            NameList::new(["", " "]),
            Err(GenerationError::NoNamesFound)
        ));
    }

    #[test]
    fn test_chunk_out_of_range_is_none() {
        let names = NameList::new(["a", "b", "c"]).unwrap();
        assert_eq!(names.chunk(1..3), Some(&["b".to_string(), "c".to_string()][..]));
        assert_eq!(names.chunk(2..5), None);
    }
}
