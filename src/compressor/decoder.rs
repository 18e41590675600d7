//! # 边界探测与降采样解码模块
//!
//! ## 设计思路
//!
//! 先只读文件头拿到宽高（不解码像素），再按规划的整数倍数做“粗解码”，
//! 确保整条链路中不出现原始分辨率的完整像素缓冲。
//!
//! ## 实现思路
//!
//! 1. `probe_dimensions`：签名校验 + 读取头部尺寸
//! 2. JPEG 走 `jpeg-decoder` 的 DCT 域缩放（1/2、1/4、1/8），直接得到较小缓冲
//! 3. 其他格式在 `image::Limits` 约束下解码，随后立即缩小并释放大缓冲
//! 4. 两条路径最终都收敛到 `floor(native / factor)` 的精确尺寸

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use fast_image_resize as fr;
use image::{DynamicImage, ImageFormat, ImageReader, Limits, RgbaImage};

use super::source::{PixelBuffer, SourceImage};
use super::{CompressConfig, CompressError};

/// 只读取文件头，返回带尺寸的 `SourceImage`。
pub fn probe_dimensions(path: &Path, config: &CompressConfig) -> Result<SourceImage, CompressError> {
    log::debug!("📐 探测图片尺寸 - 路径: {}", path.display());

    let metadata = std::fs::metadata(path).map_err(|e| {
        CompressError::FileSystem(format!("无法读取文件信息 {}：{}", path.display(), e))
    })?;

    if metadata.len() > config.max_file_size {
        return Err(CompressError::OutOfMemory(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            metadata.len() as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    validate_image_signature(path)?;

    let reader = ImageReader::open(path)
        .map_err(|e| CompressError::FileSystem(format!("无法打开图片文件：{}", e)))?
        .with_guessed_format()
        .map_err(|e| CompressError::InvalidSource(format!("无法识别图片格式：{}", e)))?;

    let format = reader
        .format()
        .ok_or_else(|| CompressError::InvalidSource("无法识别图片格式".to_string()))?;

    let (native_width, native_height) = reader
        .into_dimensions()
        .map_err(|e| CompressError::InvalidSource(format!("无法读取图片尺寸：{}", e)))?;

    if native_width == 0 || native_height == 0 {
        return Err(CompressError::InvalidSource(format!(
            "图片尺寸无效：{}x{}",
            native_width, native_height
        )));
    }

    Ok(SourceImage {
        path: path.to_path_buf(),
        native_width,
        native_height,
        format,
    })
}

/// 按整数倍数降采样解码。
///
/// 输出尺寸为 `floor(native / factor)`（最小 1 像素）。
pub fn decode_subsampled(
    source: &SourceImage,
    factor: u32,
    config: &CompressConfig,
) -> Result<PixelBuffer, CompressError> {
    let factor = factor.max(1);
    let coarse_width = (source.native_width / factor).max(1);
    let coarse_height = (source.native_height / factor).max(1);

    let decoded = if source.is_jpeg() && factor > 1 {
        match decode_jpeg_scaled(&source.path, coarse_width, coarse_height) {
            Ok(buffer) => buffer,
            Err(err) => {
                log::warn!("⚠️ JPEG DCT 缩放解码失败，回退通用解码：{}", err);
                decode_full_limited(&source.path, source.format, config)?
            }
        }
    } else {
        decode_full_limited(&source.path, source.format, config)?
    };

    let (width, height) = decoded.dimensions();
    if (width, height) == (coarse_width, coarse_height) {
        return Ok(decoded);
    }

    log::debug!(
        "🧩 粗解码收敛：{}x{} -> {}x{}（factor={}）",
        width,
        height,
        coarse_width,
        coarse_height,
        factor
    );
    reduce_exact(decoded, coarse_width, coarse_height)
}

/// 完整解码（不降采样），用于模糊检测与结果回读。
pub fn decode_full(path: &Path, config: &CompressConfig) -> Result<DynamicImage, CompressError> {
    let reader = ImageReader::open(path)
        .map_err(|e| CompressError::FileSystem(format!("无法打开图片文件：{}", e)))?
        .with_guessed_format()
        .map_err(|e| CompressError::InvalidSource(format!("无法识别图片格式：{}", e)))?;
    decode_with_limits(reader, config)
}

fn decode_full_limited(
    path: &Path,
    format: ImageFormat,
    config: &CompressConfig,
) -> Result<RgbaImage, CompressError> {
    let file = File::open(path)
        .map_err(|e| CompressError::FileSystem(format!("无法打开图片文件：{}", e)))?;
    let reader = ImageReader::with_format(BufReader::new(file), format);
    Ok(decode_with_limits(reader, config)?.into_rgba8())
}

fn decode_with_limits<R>(
    mut reader: ImageReader<R>,
    config: &CompressConfig,
) -> Result<DynamicImage, CompressError>
where
    R: std::io::BufRead + std::io::Seek,
{
    let mut limits = Limits::default();
    limits.max_alloc = Some(config.max_decoded_bytes);
    reader.limits(limits);
    Ok(reader.decode()?)
}

/// 使用 DCT 域缩放解码 JPEG，得到不小于请求尺寸的最小缓冲。
fn decode_jpeg_scaled(
    path: &Path,
    requested_width: u32,
    requested_height: u32,
) -> Result<RgbaImage, CompressError> {
    let file = File::open(path)
        .map_err(|e| CompressError::FileSystem(format!("无法打开图片文件：{}", e)))?;
    let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(file));

    let request = |value: u32| u16::try_from(value).unwrap_or(u16::MAX);
    let (width, height) = decoder
        .scale(request(requested_width), request(requested_height))
        .map_err(|e| CompressError::InvalidSource(format!("JPEG 头部解析失败：{}", e)))?;

    let pixels = decoder
        .decode()
        .map_err(|e| CompressError::InvalidSource(format!("JPEG 解码失败：{}", e)))?;

    let info = decoder
        .info()
        .ok_or_else(|| CompressError::InvalidSource("JPEG 缺少帧信息".to_string()))?;

    let (width, height) = (width as u32, height as u32);
    let pixel_count = width as usize * height as usize;
    let rgba = match info.pixel_format {
        jpeg_decoder::PixelFormat::RGB24 if pixels.len() == pixel_count * 3 => pixels
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect(),
        jpeg_decoder::PixelFormat::L8 if pixels.len() == pixel_count => {
            pixels.iter().flat_map(|&g| [g, g, g, 255]).collect()
        }
        other => {
            return Err(CompressError::InvalidSource(format!(
                "DCT 缩放路径不支持的像素格式：{:?}",
                other
            )));
        }
    };

    log::debug!(
        "🗜️ JPEG DCT 缩放解码：请求 {}x{} 实际 {}x{}",
        requested_width,
        requested_height,
        width,
        height
    );

    RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| CompressError::InvalidSource("解码后像素数据长度异常".to_string()))
}

/// 用盒式滤波把缓冲缩小到精确尺寸，原缓冲在此处释放。
fn reduce_exact(buffer: RgbaImage, width: u32, height: u32) -> Result<RgbaImage, CompressError> {
    let (src_width, src_height) = buffer.dimensions();
    let src = fr::images::Image::from_vec_u8(
        src_width,
        src_height,
        buffer.into_raw(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| CompressError::InvalidSource(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst = fr::images::Image::new(width, height, fr::PixelType::U8x4);
    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Box));
    fr::Resizer::new()
        .resize(&src, &mut dst, Some(&options))
        .map_err(|e| CompressError::InvalidSource(format!("粗解码缩小失败：{}", e)))?;

    RgbaImage::from_raw(width, height, dst.into_vec())
        .ok_or_else(|| CompressError::InvalidSource("缩小后像素数据长度异常".to_string()))
}

/// 通过文件签名确认是图片，避免把任意文件交给解码器。
fn validate_image_signature(path: &Path) -> Result<(), CompressError> {
    let mut head = [0u8; 64];
    let read = File::open(path)
        .and_then(|mut file| file.read(&mut head))
        .map_err(|e| CompressError::FileSystem(format!("无法读取文件头：{}", e)))?;

    if read == 0 {
        return Err(CompressError::InvalidSource("图片内容为空".to_string()));
    }

    let kind = infer::get(&head[..read])
        .ok_or_else(|| CompressError::InvalidSource("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(CompressError::InvalidSource(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    Ok(())
}
