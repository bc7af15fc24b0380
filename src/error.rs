use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 生成任务错误
    #[error("生成错误: {0}")]
    Generation(#[from] GenerationError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// HTTP 客户端创建失败
    #[error("创建 HTTP 客户端失败: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// 单个生成任务的错误
///
/// 所有错误都只作用于当前任务，不会终止整个进程
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 未选择证书模板
    #[error("请先上传证书模板")]
    NoTemplate,
    /// 名单中没有姓名
    #[error("名单中没有找到任何姓名")]
    NoNamesFound,
    /// 姓名提取服务出错
    #[error("姓名提取失败: {0}")]
    ExtractionFailure(#[source] ApiError),
    /// 某一批渲染失败（chunk_index 从 0 开始）
    #[error("第 {} 批证书生成失败: {cause}", .chunk_index + 1)]
    BatchFailure {
        chunk_index: usize,
        #[source]
        cause: ApiError,
    },
    /// 合并失败
    #[error("证书合并失败: {0}")]
    MergeFailure(#[from] MergeError),
    /// 任务描述不合法
    #[error("任务配置无效: {0}")]
    InvalidJob(String),
    /// 已有任务正在执行
    #[error("已有任务正在生成中，请稍后再试")]
    JobInProgress,
    /// 读写文件失败
    #[error(transparent)]
    File(#[from] FileError),
}

/// 远端服务调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("请求 {endpoint} 失败: {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务返回非成功状态码
    #[error("{endpoint} 返回异常状态 {status}: {body}")]
    BadStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 响应体无法解析
    #[error("{endpoint} 返回内容无法解析: {source}")]
    InvalidBody {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 结果合并错误
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("没有可合并的结果")]
    Empty,
    #[error("第 {} 份文档无法读取: {reason}", .index + 1)]
    CorruptDocument { index: usize, reason: String },
    #[error("第 {} 份文档已加密", .index + 1)]
    EncryptedDocument { index: usize },
    #[error("第 {} 份文档没有任何页面", .index + 1)]
    EmptyDocument { index: usize },
    #[error("第 {} 个压缩包无法读取: {reason}", .index + 1)]
    CorruptArchive { index: usize, reason: String },
    #[error("写出合并结果失败: {0}")]
    WriteFailed(String),
    #[error("历史记录中没有第 {} 条", .index + 1)]
    MissingEntry { index: usize },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置项 {name} 不能为空")]
    MissingValue { name: String },
    #[error("配置项 {name} 必须大于 0")]
    MustBePositive { name: String },
    #[error("配置项 {name} = {threshold} 小于分批大小 {chunk_size}")]
    ThresholdBelowChunkSize {
        name: String,
        threshold: usize,
        chunk_size: usize,
    },
}

// ========== 便捷构造函数 ==========

impl FileError {
    /// 根据 io 错误类型区分"不存在"和"读取失败"
    pub fn read(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            FileError::NotFound { path }
        } else {
            FileError::ReadFailed { path, source }
        }
    }

    pub fn write(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::WriteFailed {
            path: path.into(),
            source,
        }
    }
}

impl ApiError {
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
