use std::fs;
use std::path::Path;

use crate::compressor::CompressConfig;
use crate::error::AppError;

/// 读取 JSON 设置文件；文件不存在时返回默认配置。
pub fn load_settings(path: &Path) -> Result<CompressConfig, AppError> {
    if !path.exists() {
        log::debug!("设置文件不存在，使用默认配置: {}", path.display());
        return Ok(CompressConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config = serde_json::from_str::<CompressConfig>(&content)
        .map_err(|e| AppError::Settings(format!("解析设置文件失败: {}", e)))?;

    config.validate()?;
    Ok(config)
}

/// 将当前配置写回设置文件。
pub fn save_settings(path: &Path, config: &CompressConfig) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::Storage(format!("创建设置目录失败: {}", e)))?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))?;

    fs::write(path, content)?;
    Ok(())
}
