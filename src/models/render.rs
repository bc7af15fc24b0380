use crate::error::{FileError, GenerationError};
use crate::models::output::OutputKind;
use std::path::Path;

/// 证书模板图片
#[derive(Debug, Clone)]
pub struct TemplateFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl TemplateFile {
    /// 读取模板文件
    ///
    /// 未指定模板时返回 `NoTemplate`，在任何网络请求之前检查
    pub async fn load(path: Option<&Path>) -> Result<Self, GenerationError> {
        let path = match path {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => return Err(GenerationError::NoTemplate),
        };

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| FileError::read(path.display().to_string(), e))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "template.png".to_string());

        Ok(Self { file_name, bytes })
    }

    /// 根据扩展名推断 MIME 类型
    pub fn mime_type(&self) -> &'static str {
        let lower = self.file_name.to_ascii_lowercase();
        if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            "image/jpeg"
        } else if lower.ends_with(".webp") {
            "image/webp"
        } else {
            "image/png"
        }
    }
}

/// 姓名框（编辑器画布坐标，起点与终点）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRect {
    pub sx: f64,
    pub sy: f64,
    pub ex: f64,
    pub ey: f64,
}

impl FieldRect {
    pub fn from_array(coords: [f64; 4]) -> Self {
        let [sx, sy, ex, ey] = coords;
        Self { sx, sy, ex, ey }
    }

    /// 框是否有面积且坐标有效
    pub fn is_valid(&self) -> bool {
        let all_finite = [self.sx, self.sy, self.ex, self.ey]
            .iter()
            .all(|v| v.is_finite());
        all_finite && self.sx != self.ex && self.sy != self.ey
    }

    /// 表单中的 coords 字段
    pub fn to_form_value(&self) -> String {
        format!("{},{},{},{}", self.sx, self.sy, self.ex, self.ey)
    }
}

/// 所有批次共享的渲染参数
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub font_family: String,
    pub font_size: u32,
    pub font_color: String,
    pub field_rect: FieldRect,
}

/// 发往渲染服务的一次请求
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub template: &'a TemplateFile,
    /// 本批姓名；空白证书为 None
    pub names: Option<&'a [String]>,
    /// 本批第一个姓名在整个名单中的位置
    pub start_index: usize,
    pub options: &'a RenderOptions,
    pub kind: OutputKind,
    /// 空白证书数量
    pub quantity: Option<usize>,
}
