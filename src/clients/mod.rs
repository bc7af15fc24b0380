//! 远端服务客户端
//!
//! 渲染服务和姓名提取服务各自通过一个 trait 暴露能力，
//! 上层只依赖 trait，测试时可替换为内存实现

pub mod extract_client;
pub mod render_client;

use crate::error::ApiError;
use crate::models::RenderRequest;
use crate::utils::truncate_text;
use std::future::Future;

pub use extract_client::ExtractClient;
pub use render_client::RenderClient;

/// 证书渲染能力
pub trait RenderService {
    /// 渲染一批证书，返回 PDF 或 ZIP 的原始字节
    fn render_batch(
        &self,
        request: RenderRequest<'_>,
    ) -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send;
}

/// 姓名提取能力
pub trait NameExtractor {
    /// 上传名单文件，返回按顺序排列的姓名
    fn extract_names(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;
}

/// 拼接服务地址和接口路径
pub(crate) fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// 检查响应状态，非 2xx 时读取响应体作为错误信息
pub(crate) async fn ensure_success(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::BadStatus {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body: truncate_text(&body, 200),
    })
}
