//! 输出目录管理模块
//!
//! # 设计思路
//!
//! 统一管理压缩结果的存储路径：`<存储根>/SiliCompressor/Images`，
//! 并在目录不存在时自动创建。
//!
//! # 实现思路
//!
//! - 存储根来自 `CompressConfig`，调用方可在测试中注入临时目录。
//! - 目录不存在时自动 `create_dir_all`，避免上层判断。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::compressor::CompressConfig;
use crate::error::AppError;

/// 存储目录信息
#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    pub path: String,
    pub total_size: u64,
    pub file_count: u64,
}

/// 获取输出目录，不存在时创建
///
/// # 返回
/// - `Ok(PathBuf)` — 可用的输出目录
/// - `Err(AppError::Storage)` — 无法创建目录
pub fn output_dir(config: &CompressConfig) -> Result<PathBuf, AppError> {
    let dir = config.output_dir();
    if !dir.is_dir() {
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::Storage(format!("创建输出目录 '{}' 失败: {}", dir.display(), e))
        })?;
    }
    Ok(dir)
}

/// 获取输出目录信息（路径 + 占用大小 + 文件数）
pub fn output_dir_info(config: &CompressConfig) -> Result<StorageInfo, AppError> {
    let dir = output_dir(config)?;
    let mut total_size: u64 = 0;
    let mut file_count: u64 = 0;

    for entry in fs::read_dir(&dir)?.flatten() {
        if let Ok(metadata) = entry.metadata() {
            if metadata.is_file() {
                total_size += metadata.len();
                file_count += 1;
            }
        }
    }

    Ok(StorageInfo {
        path: dir.to_string_lossy().to_string(),
        total_size,
        file_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_is_created_on_demand() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = CompressConfig::with_storage_root(root.path());

        let dir = output_dir(&config).expect("output dir");
        assert!(dir.is_dir());
        assert!(dir.ends_with("SiliCompressor/Images"));
    }

    #[test]
    fn info_counts_files() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = CompressConfig::with_storage_root(root.path());
        let dir = output_dir(&config).expect("output dir");
        fs::write(dir.join("1.jpg"), [0u8; 10]).expect("write");
        fs::write(dir.join("2.jpg"), [0u8; 5]).expect("write");

        let info = output_dir_info(&config).expect("info");
        assert_eq!(info.file_count, 2);
        assert_eq!(info.total_size, 15);
    }

    #[test]
    fn blocked_root_reports_storage_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let blocker = root.path().join("blocker");
        fs::write(&blocker, b"x").expect("write");

        let config = CompressConfig::with_storage_root(&blocker);
        assert!(matches!(output_dir(&config), Err(AppError::Storage(_))));
    }
}
