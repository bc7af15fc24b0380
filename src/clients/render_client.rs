/// 渲染服务客户端
///
/// 每次调用对应一次 `/generate` 请求，返回一批证书的原始字节
use crate::clients::{endpoint_url, ensure_success, RenderService};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::RenderRequest;
use reqwest::multipart::{Form, Part};
use tracing::debug;

const RENDER_PATH: &str = "/generate";

pub struct RenderClient {
    http: reqwest::Client,
    base_url: String,
}

impl RenderClient {
    /// 创建新的渲染客户端
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.service_base_url.clone(),
        }
    }

    /// 构建 multipart 表单
    fn build_form(request: &RenderRequest<'_>) -> Result<Form, ApiError> {
        let template_part = Part::bytes(request.template.bytes.clone())
            .file_name(request.template.file_name.clone())
            .mime_str(request.template.mime_type())
            .map_err(|e| ApiError::request_failed(RENDER_PATH, e))?;

        let options = request.options;
        let mut form = Form::new()
            .part("template", template_part)
            .text("start_index", request.start_index.to_string())
            .text("font_style", options.font_family.clone())
            .text("font_size", options.font_size.to_string())
            .text("font_color", options.font_color.clone())
            .text("coords", options.field_rect.to_form_value())
            .text("output_format", request.kind.as_form_value());

        if let Some(names) = request.names {
            let names_part = Part::bytes(names.join("\n").into_bytes())
                .file_name("names.txt")
                .mime_str("text/plain")
                .map_err(|e| ApiError::request_failed(RENDER_PATH, e))?;
            form = form.part("names", names_part);
        }

        if let Some(quantity) = request.quantity {
            form = form.text("quantity", quantity.to_string());
        }

        Ok(form)
    }
}

impl RenderService for RenderClient {
    async fn render_batch(&self, request: RenderRequest<'_>) -> Result<Vec<u8>, ApiError> {
        let url = endpoint_url(&self.base_url, RENDER_PATH);
        debug!(
            "渲染请求: start_index={}, 姓名数={}, 数量={:?}, 格式={}",
            request.start_index,
            request.names.map_or(0, |n| n.len()),
            request.quantity,
            request.kind.as_form_value()
        );

        let form = Self::build_form(&request)?;
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::request_failed(RENDER_PATH, e))?;

        let response = ensure_success(RENDER_PATH, response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::request_failed(RENDER_PATH, e))?;

        debug!("渲染完成，返回 {} 字节", bytes.len());
        Ok(bytes.to_vec())
    }
}
