use crate::error::FileError;
use crate::models::job::JobSpec;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载生成任务
///
/// 任务中的相对路径（模板、名单）以任务文件所在目录为基准
pub async fn load_job_file(toml_file_path: &Path) -> Result<JobSpec, FileError> {
    let display_path = toml_file_path.display().to_string();
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| FileError::read(display_path.clone(), e))?;

    let mut job: JobSpec = toml::from_str(&content).map_err(|e| FileError::TomlParseFailed {
        path: display_path.clone(),
        source: e,
    })?;

    let base_dir = toml_file_path.parent().unwrap_or_else(|| Path::new("."));
    job.template = job.template.map(|p| resolve(base_dir, p));
    job.names_file = job.names_file.map(|p| resolve(base_dir, p));

    // 设置文件路径
    job.file_path = Some(display_path);

    Ok(job)
}

fn resolve(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.as_os_str().is_empty() || path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

/// 从文件夹中加载所有任务文件，按文件名排序
///
/// 单个文件解析失败只记录警告，不影响其他任务
pub async fn load_all_job_files(folder_path: &str) -> Result<Vec<JobSpec>, FileError> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        });
    }

    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| FileError::read(folder_path, e))?;

    let mut toml_files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| FileError::read(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut jobs = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_job_file(&path).await {
            Ok(job) => {
                tracing::info!("成功加载任务: {} ({})", job.name, job.output_format);
                jobs.push(job);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(jobs)
}
