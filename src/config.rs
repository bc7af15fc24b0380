use crate::error::ConfigError;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    // --- 远端服务 ---
    /// 渲染 / 姓名提取服务地址
    pub service_base_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 目录与日志 ---
    /// 任务 TOML 存放目录
    pub job_folder: String,
    /// 证书输出目录
    pub output_dir: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 分批策略 ---
    pub document_threshold: usize,
    pub document_chunk_size: usize,
    pub archive_threshold: usize,
    pub archive_chunk_size: usize,
    /// 远端服务每个窗口可承受的渲染次数
    pub render_ceiling: usize,
    /// 批次之间的冷却时长（毫秒）
    pub cooldown_ms: u64,
    // --- 历史记录 ---
    /// 会话结束时是否合并历史文档
    pub merge_history: bool,
    /// 合并前从历史记录中移除的条目（从 0 开始）
    pub history_merge_exclude: Vec<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 120,
            job_folder: "jobs".to_string(),
            output_dir: "output".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            document_threshold: 150,
            document_chunk_size: 50,
            archive_threshold: 50,
            archive_chunk_size: 20,
            render_ceiling: 100,
            cooldown_ms: 1500,
            merge_history: true,
            history_merge_exclude: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            service_base_url: std::env::var("SERVICE_BASE_URL").unwrap_or(default.service_base_url),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS").unwrap_or(default.request_timeout_secs),
            job_folder: std::env::var("JOB_FOLDER").unwrap_or(default.job_folder),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: parse_env("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
            document_threshold: parse_env("DOCUMENT_THRESHOLD").unwrap_or(default.document_threshold),
            document_chunk_size: parse_env("DOCUMENT_CHUNK_SIZE").unwrap_or(default.document_chunk_size),
            archive_threshold: parse_env("ARCHIVE_THRESHOLD").unwrap_or(default.archive_threshold),
            archive_chunk_size: parse_env("ARCHIVE_CHUNK_SIZE").unwrap_or(default.archive_chunk_size),
            render_ceiling: parse_env("RENDER_CEILING").unwrap_or(default.render_ceiling),
            cooldown_ms: parse_env("COOLDOWN_MS").unwrap_or(default.cooldown_ms),
            merge_history: parse_env("MERGE_HISTORY").unwrap_or(default.merge_history),
            history_merge_exclude: std::env::var("HISTORY_MERGE_EXCLUDE")
                .map(|v| parse_index_list(&v))
                .unwrap_or(default.history_merge_exclude),
        }
    }

    /// 校验分批参数
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_base_url.trim().is_empty() {
            return Err(ConfigError::MissingValue {
                name: "SERVICE_BASE_URL".to_string(),
            });
        }

        for (name, size) in [
            ("DOCUMENT_CHUNK_SIZE", self.document_chunk_size),
            ("ARCHIVE_CHUNK_SIZE", self.archive_chunk_size),
            ("RENDER_CEILING", self.render_ceiling),
        ] {
            if size == 0 {
                return Err(ConfigError::MustBePositive {
                    name: name.to_string(),
                });
            }
        }

        for (name, threshold, chunk_size) in [
            ("DOCUMENT_THRESHOLD", self.document_threshold, self.document_chunk_size),
            ("ARCHIVE_THRESHOLD", self.archive_threshold, self.archive_chunk_size),
        ] {
            if threshold < chunk_size {
                return Err(ConfigError::ThresholdBelowChunkSize {
                    name: name.to_string(),
                    threshold,
                    chunk_size,
                });
            }
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// 解析 "1,3,5" 形式的索引列表，忽略无法解析的项
fn parse_index_list(raw: &str) -> Vec<usize> {
    raw.split(',')
        .filter_map(|item| item.trim().parse().ok())
        .collect()
}
