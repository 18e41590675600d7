//! # 图片压缩工具 — 命令行入口
//!
//! 本文件仅负责日志初始化、设置加载与请求派发。
//! 压缩逻辑全部位于 `compressor` 模块，详见 `lib.rs` 架构文档。
//!
//! 用法：`image-compressor [--delete] <uri>...`

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use image_compressor::compressor::{
    CompressError, CompressedImage, CompressorContext, CompressorService, FileResolver,
};
use image_compressor::error::AppError;
use image_compressor::{settings, storage};

const SETTINGS_ENV: &str = "IMAGE_COMPRESSOR_SETTINGS";

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run().await {
        log::error!("启动失败: {err}");
        println!("{}", json!({ "error": err.code(), "message": err.to_string() }));
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let mut delete_source = false;
    let mut uris = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--delete" => delete_source = true,
            _ => uris.push(arg),
        }
    }

    let config = match std::env::var_os(SETTINGS_ENV) {
        Some(path) => settings::load_settings(&PathBuf::from(path))?,
        None => Default::default(),
    };
    log::info!("setup: 输出目录 {}", config.output_dir().display());

    let service = CompressorService::new(CompressorContext::new(config, Arc::new(FileResolver)))?;

    let mut failures = 0usize;
    for uri in uris {
        let verdict = service.image_quality(uri.clone()).await;
        let result = if delete_source {
            service.compress_and_delete_source(uri.clone()).await
        } else {
            service.compress(uri.clone()).await
        };

        let quality = match verdict {
            Ok(verdict) => json!(verdict.as_str()),
            Err(err) => {
                log::warn!("模糊检测失败 - {uri}: {err}");
                serde_json::Value::Null
            }
        };

        if result.is_err() {
            failures += 1;
        }
        let line = result_line(&uri, &result, quality);
        println!("{line}");
    }

    if let Ok(info) = storage::output_dir_info(service.compressor().config()) {
        log::info!(
            "输出目录: {} 文件数: {} 总大小: {} 字节",
            info.path,
            info.file_count,
            info.total_size
        );
    }

    if failures > 0 {
        std::process::exit(2);
    }
    Ok(())
}

/// 单个输入的一行 JSON 结果；只输出字节数，不输出编码内容。
fn result_line(
    uri: &str,
    result: &Result<CompressedImage, CompressError>,
    quality: serde_json::Value,
) -> serde_json::Value {
    match result {
        Ok(compressed) => json!({
            "source": uri,
            "path": compressed.path_string(),
            "width": compressed.width,
            "height": compressed.height,
            "bytes": compressed.bytes.len(),
            "quality": quality,
        }),
        Err(err) => json!({
            "source": uri,
            "error": err.code(),
            "message": err.to_string(),
            "quality": quality,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_line_reports_byte_count() {
        let compressed = CompressedImage {
            path: PathBuf::from("/tmp/SiliCompressor/Images/1.jpg"),
            bytes: vec![0u8; 4096],
            width: 1795,
            height: 1346,
        };
        let line = result_line("a.jpg", &Ok(compressed), json!("blur image"));

        assert_eq!(line["bytes"], json!(4096));
        assert_eq!(line["width"], json!(1795));
        assert!(line.to_string().len() < 256);
    }

    #[test]
    fn failure_line_carries_error_code() {
        let result = Err(CompressError::FileSystem("missing".to_string()));
        let line = result_line("b.jpg", &result, serde_json::Value::Null);

        assert_eq!(line["error"], json!("file_system"));
        assert!(line.get("bytes").is_none());
    }
}
