//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `Compressor` 只负责流程编排，不涉及线程与任务调度。
//! 压缩链路固定为：
//! 1. 解析 URI → 源文件路径
//! 2. 边界探测 → 尺寸规划
//! 3. 降采样解码 → 精确缩放
//! 4. EXIF 方向校正 → JPEG 编码落盘
//!
//! 模糊检测是独立链路：对原始分辨率重新解码后判定。
//!
//! ## 实现思路
//!
//! - 上下文（配置 + 解析器）由调用方构建一次后注入，替代全局单例。
//! - 每次调用都从零构建中间缓冲，不做跨请求缓存。
//! - 记录 `probe/decode/rescale/orient/encode/total` 阶段耗时，便于性能诊断。

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;

use super::blur::{self, BlurVerdict};
use super::encoder;
use super::resolver::{self, ContentResolver, FileResolver};
use super::source::CompressedImage;
use super::{CompressConfig, CompressError, decoder, orientation, planner, rescaler};
use crate::storage;

/// 压缩器的注入上下文，构建后只读。
#[derive(Clone)]
pub struct CompressorContext {
    pub config: CompressConfig,
    pub resolver: Arc<dyn ContentResolver>,
}

impl CompressorContext {
    pub fn new(config: CompressConfig, resolver: Arc<dyn ContentResolver>) -> Self {
        Self { config, resolver }
    }
}

impl Default for CompressorContext {
    fn default() -> Self {
        Self::new(CompressConfig::default(), Arc::new(FileResolver))
    }
}

impl fmt::Debug for CompressorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressorContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// 图片压缩器。
///
/// 不持有任何可变状态，可在多个请求间共享。
#[derive(Debug, Clone)]
pub struct Compressor {
    context: CompressorContext,
}

impl Compressor {
    /// 根据注入上下文创建压缩器，配置无效时直接拒绝。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_compressor::compressor::{CompressConfig, Compressor, CompressorContext, FileResolver};
    /// use std::sync::Arc;
    ///
    /// let context = CompressorContext::new(CompressConfig::default(), Arc::new(FileResolver));
    /// let compressor = Compressor::new(context)?;
    /// let result = compressor.compress("file:///tmp/photo.jpg")?;
    /// println!("{}", result.path.display());
    /// # Ok::<(), image_compressor::compressor::CompressError>(())
    /// ```
    pub fn new(context: CompressorContext) -> Result<Self, CompressError> {
        context.config.validate()?;
        Ok(Self { context })
    }

    pub fn config(&self) -> &CompressConfig {
        &self.context.config
    }

    /// 解析 URI 对应的源文件路径。
    pub fn resolve_path(&self, uri: &str) -> PathBuf {
        resolver::resolve_source_path(self.context.resolver.as_ref(), uri)
    }

    /// 压缩 URI 指向的图片，返回写入的结果。
    pub fn compress(&self, uri: &str) -> Result<CompressedImage, CompressError> {
        let path = self.resolve_path(uri);
        self.compress_path(&path)
    }

    /// 压缩后尽力删除源文件；删除失败只记录日志。
    pub fn compress_and_delete_source(&self, uri: &str) -> Result<CompressedImage, CompressError> {
        let path = self.resolve_path(uri);
        let compressed = self.compress_path(&path)?;
        delete_source(&path);
        Ok(compressed)
    }

    /// 压缩内置资源字节：先转存为临时 JPEG，再走同一条链路，结束后删除临时文件。
    pub fn compress_resource(&self, bytes: &[u8]) -> Result<CompressedImage, CompressError> {
        let config = &self.context.config;
        let resource = image::load_from_memory(bytes)?;

        let dir = storage::output_dir(config)
            .map_err(|e| CompressError::DestinationUnavailable(e.to_string()))?;
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let temp = tempfile::Builder::new()
            .prefix(&format!("JPEG_{}_", timestamp))
            .suffix(".jpg")
            .tempfile_in(&dir)
            .map_err(|e| CompressError::DestinationUnavailable(format!("无法创建临时文件：{}", e)))?;

        let staged = encoder::encode_jpeg(&resource.into_rgba8(), config.resource_quality)?;
        std::fs::write(temp.path(), &staged).map_err(|e| {
            CompressError::DestinationUnavailable(format!("写入临时文件失败：{}", e))
        })?;

        let result = self.compress_path(temp.path());

        let temp_path = temp.path().to_path_buf();
        match temp.close() {
            Ok(()) => log::debug!("🧹 临时资源文件已删除 - {}", temp_path.display()),
            Err(err) => log::warn!("⚠️ 临时资源文件删除失败 - {}：{}", temp_path.display(), err),
        }

        result
    }

    /// 压缩后把结果重新解码为内存图像。
    pub fn compress_to_buffer(
        &self,
        uri: &str,
        delete_source: bool,
    ) -> Result<DynamicImage, CompressError> {
        let compressed = if delete_source {
            self.compress_and_delete_source(uri)?
        } else {
            self.compress(uri)?
        };
        decoder::decode_full(&compressed.path, &self.context.config)
    }

    /// 对原始分辨率图像做模糊判定。
    pub fn image_quality(&self, uri: &str) -> Result<BlurVerdict, CompressError> {
        let path = self.resolve_path(uri);
        let config = &self.context.config;
        let start = Instant::now();

        let original = decoder::decode_full(&path, config)?;
        let verdict = blur::classify_blur(&original, config.blur_threshold);

        log::info!(
            "✅ 模糊检测完成 - 路径: {} 结果: {} 最大响应: {} 耗时: {}ms",
            path.display(),
            verdict,
            verdict.max_response,
            start.elapsed().as_millis()
        );
        Ok(verdict)
    }

    /// 压缩主链路。
    pub fn compress_path(&self, path: &Path) -> Result<CompressedImage, CompressError> {
        let config = &self.context.config;
        let total_start = Instant::now();

        let probe_start = Instant::now();
        let source = decoder::probe_dimensions(path, config)?;
        let plan = planner::plan(source.native_width, source.native_height, config);
        let probe_elapsed = probe_start.elapsed();

        log::info!(
            "📐 尺寸规划 - 原始: {}x{} 包围盒: {}x{} 目标: {}x{} 降采样: {}",
            source.native_width,
            source.native_height,
            plan.bound_width,
            plan.bound_height,
            plan.target_width,
            plan.target_height,
            plan.downsample_factor
        );

        let decode_start = Instant::now();
        let coarse = decoder::decode_subsampled(&source, plan.downsample_factor, config)
            .inspect_err(|err| {
                if err.is_missing_buffer() {
                    log::warn!("⚠️ 未得到可用像素缓冲，终止本次压缩：{}", err);
                } else {
                    log::error!("❌ 降采样解码失败：{}", err);
                }
            })?;
        let decode_elapsed = decode_start.elapsed();

        let rescale_start = Instant::now();
        let scaled = rescaler::rescale_to_target(coarse, &plan, config.max_decoded_bytes)
            .inspect_err(|err| log::error!("❌ 精确缩放失败：{}", err))?;
        let rescale_elapsed = rescale_start.elapsed();

        let orient_start = Instant::now();
        let tag = orientation::read_orientation(&source.path, config.mirror_aware_orientation);
        let oriented = tag.apply(scaled);
        let orient_elapsed = orient_start.elapsed();

        let encode_start = Instant::now();
        let compressed = encoder::write_compressed(oriented, config)?;
        let encode_elapsed = encode_start.elapsed();

        log::info!(
            "✅ 图片压缩完成 - probe={}ms decode={}ms rescale={}ms orient={}ms encode={}ms total={}ms",
            probe_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            rescale_elapsed.as_millis(),
            orient_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(compressed)
    }
}

fn delete_source(path: &Path) {
    if !path.exists() {
        return;
    }

    match std::fs::remove_file(path) {
        Ok(()) => log::debug!("🗑️ 源文件已删除 - {}", path.display()),
        Err(err) => log::warn!("⚠️ 源文件未删除 - {}：{}", path.display(), err),
    }
}
