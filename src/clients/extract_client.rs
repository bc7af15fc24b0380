/// 姓名提取服务客户端
///
/// 名单文件的解析（txt / xlsx / pdf）由远端服务完成，这里只负责上传和读取结果
use crate::clients::{endpoint_url, ensure_success, NameExtractor};
use crate::config::Config;
use crate::error::ApiError;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

const EXTRACT_PATH: &str = "/extract-names";

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    names: Vec<String>,
}

pub struct ExtractClient {
    http: reqwest::Client,
    base_url: String,
}

impl ExtractClient {
    /// 创建新的提取客户端
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.service_base_url.clone(),
        }
    }
}

impl NameExtractor for ExtractClient {
    async fn extract_names(&self, file_name: &str, bytes: Vec<u8>) -> Result<Vec<String>, ApiError> {
        let url = endpoint_url(&self.base_url, EXTRACT_PATH);
        debug!("上传名单文件: {} ({} 字节)", file_name, bytes.len());

        let form = Form::new().part("names", Part::bytes(bytes).file_name(file_name.to_string()));
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::request_failed(EXTRACT_PATH, e))?;

        let response = ensure_success(EXTRACT_PATH, response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::request_failed(EXTRACT_PATH, e))?;

        let parsed: ExtractResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::InvalidBody {
                endpoint: EXTRACT_PATH.to_string(),
                source: e,
            })?;

        debug!("提取到 {} 个姓名", parsed.names.len());
        Ok(parsed.names)
    }
}
