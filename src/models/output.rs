use serde::{Deserialize, Serialize};
use std::fmt;

/// 输出类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    /// 所有证书合并为一个 PDF
    #[serde(rename = "pdf")]
    Document,
    /// 每人一张 PNG，打包为 ZIP
    #[serde(rename = "zip")]
    Archive,
    /// 不填写姓名的空白证书，按数量生成一个多页 PDF
    #[serde(rename = "blank")]
    BlankBatch,
}

impl OutputKind {
    /// 发送给渲染服务的 output_format 字段
    pub fn as_form_value(self) -> &'static str {
        match self {
            OutputKind::Document => "pdf",
            OutputKind::Archive => "zip",
            OutputKind::BlankBatch => "blank",
        }
    }

    /// 下载时使用的固定文件名
    pub fn file_name(self) -> &'static str {
        match self {
            OutputKind::Document | OutputKind::BlankBatch => "Certificates.pdf",
            OutputKind::Archive => "Certificates.zip",
        }
    }

    /// 结果是否为文档（PDF）
    pub fn is_document(self) -> bool {
        matches!(self, OutputKind::Document | OutputKind::BlankBatch)
    }

    /// 是否需要姓名名单
    pub fn needs_names(self) -> bool {
        !matches!(self, OutputKind::BlankBatch)
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutputKind::Document => "PDF 文档",
            OutputKind::Archive => "PNG 压缩包",
            OutputKind::BlankBatch => "空白证书",
        };
        f.write_str(label)
    }
}
