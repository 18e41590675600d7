//! # 编码与落盘模块
//!
//! ## 设计思路
//!
//! 固定输出一种有损格式（JPEG）与一个质量值，目标路径为
//! `<存储根>/SiliCompressor/Images/<毫秒时间戳>.jpg`。
//! 目标无法打开写入时返回独立的 `DestinationUnavailable`，不重试。

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::buffer::ConvertBuffer;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use super::source::{CompressedImage, PixelBuffer};
use super::{CompressConfig, CompressError};
use crate::storage;

/// 同一毫秒内重名时最多顺延的次数。
const MAX_NAME_ATTEMPTS: i64 = 64;

/// 将 RGBA 缓冲编码为 JPEG 字节（丢弃 alpha 通道）。
pub fn encode_jpeg(buffer: &PixelBuffer, quality: u8) -> Result<Vec<u8>, CompressError> {
    let rgb: RgbImage = buffer.convert();
    let (width, height) = rgb.dimensions();

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| CompressError::Encode(format!("JPEG 编码失败：{}", e)))?;
    Ok(bytes)
}

/// 编码并写入输出目录，返回压缩结果。
pub fn write_compressed(
    buffer: PixelBuffer,
    config: &CompressConfig,
) -> Result<CompressedImage, CompressError> {
    let (width, height) = buffer.dimensions();
    let bytes = encode_jpeg(&buffer, config.jpeg_quality)?;
    drop(buffer);

    let dir = storage::output_dir(config)
        .map_err(|e| CompressError::DestinationUnavailable(e.to_string()))?;
    let path = write_unique(&dir, &config.output_extension, &bytes)?;

    log::info!(
        "💾 压缩结果已写入 - 路径: {} 尺寸: {}x{} 大小: {:.1} KB",
        path.display(),
        width,
        height,
        bytes.len() as f64 / 1024.0
    );

    Ok(CompressedImage {
        path,
        bytes,
        width,
        height,
    })
}

/// 以毫秒时间戳命名写入文件；同名已存在时顺延时间戳。
fn write_unique(dir: &Path, extension: &str, bytes: &[u8]) -> Result<PathBuf, CompressError> {
    let base = Utc::now().timestamp_millis();

    for offset in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(format!("{}.{}", base + offset, extension));
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(CompressError::DestinationUnavailable(format!(
                    "无法创建目标文件 {}：{}",
                    path.display(),
                    err
                )));
            }
        };

        write_or_discard(&path, file, bytes)?;
        return Ok(path);
    }

    Err(CompressError::DestinationUnavailable(format!(
        "目录 {} 中无可用文件名",
        dir.display()
    )))
}

/// 写入已创建的目标文件；写入失败时删除残缺文件。
fn write_or_discard<W: Write>(path: &Path, mut writer: W, bytes: &[u8]) -> Result<(), CompressError> {
    let result = writer.write_all(bytes).and_then(|()| writer.flush());
    drop(writer);

    result.map_err(|err| {
        if let Err(cleanup) = std::fs::remove_file(path) {
            log::warn!("⚠️ 残缺输出文件删除失败 - {}：{}", path.display(), cleanup);
        }
        CompressError::DestinationUnavailable(format!("写入目标文件失败 {}：{}", path.display(), err))
    })
}
