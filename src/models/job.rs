use crate::error::GenerationError;
use crate::models::output::OutputKind;
use crate::models::render::{FieldRect, RenderOptions};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

/// 字号范围，与编辑器下拉框一致
pub const MIN_FONT_SIZE: u32 = 1;
pub const MAX_FONT_SIZE: u32 = 120;

static COLOR_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

/// 一个生成任务（从 TOML 文件加载）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    /// 证书模板图片
    #[serde(default)]
    pub template: Option<PathBuf>,
    /// 姓名名单文件（txt / xlsx / pdf，由提取服务解析）
    #[serde(default)]
    pub names_file: Option<PathBuf>,
    pub output_format: OutputKind,
    /// 空白证书数量
    #[serde(default)]
    pub quantity: Option<usize>,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_font_color")]
    pub font_color: String,
    /// [sx, sy, ex, ey]
    pub field_rect: [f64; 4],

    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

fn default_font_family() -> String {
    "Poppins.ttf".to_string()
}

fn default_font_size() -> u32 {
    40
}

fn default_font_color() -> String {
    "#000000".to_string()
}

impl JobSpec {
    /// 校验任务参数
    ///
    /// 模板缺失不在这里判断，由 `TemplateFile::load` 报告 `NoTemplate`
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.name.trim().is_empty() {
            return Err(invalid("任务名称不能为空"));
        }

        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(invalid(format!(
                "字号 {} 超出范围 [{}, {}]",
                self.font_size, MIN_FONT_SIZE, MAX_FONT_SIZE
            )));
        }

        let color_re = COLOR_RE
            .get_or_init(|| Regex::new(r"^#[0-9a-fA-F]{6}$"))
            .as_ref()
            .map_err(|e| invalid(e.to_string()))?;
        if !color_re.is_match(&self.font_color) {
            return Err(invalid(format!("颜色格式错误: {}", self.font_color)));
        }

        if self.font_family.trim().is_empty() {
            return Err(invalid("字体不能为空"));
        }

        if !FieldRect::from_array(self.field_rect).is_valid() {
            return Err(invalid(format!("姓名框坐标无效: {:?}", self.field_rect)));
        }

        if self.output_format.needs_names() {
            if self.names_file.is_none() {
                return Err(invalid("请指定姓名名单文件"));
            }
        } else if !matches!(self.quantity, Some(q) if q > 0) {
            return Err(invalid("空白证书需要指定大于 0 的数量"));
        }

        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            font_family: self.font_family.clone(),
            font_size: self.font_size,
            font_color: self.font_color.clone(),
            field_rect: FieldRect::from_array(self.field_rect),
        }
    }
}

fn invalid(message: impl Into<String>) -> GenerationError {
    GenerationError::InvalidJob(message.into())
}
