//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“固定策略”集中到 `CompressConfig`：包围盒尺寸、编码质量、解码像素余量、
//! 模糊阈值与输出目录。默认值即标准行为，调用方只在测试或特殊部署时覆盖。
//!
//! ## 实现思路
//!
//! - `Default` 提供标准参数（1795 × 1287 包围盒、质量 80）。
//! - 通过 `serde(default)` 支持从 JSON 设置文件部分覆盖。
//! - `validate` 在构建 `Compressor` 前拒绝无意义的组合。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::CompressError;

/// 图片压缩配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    /// 包围盒长边（像素）。
    pub long_edge: u32,
    /// 包围盒短边（像素）。
    pub short_edge: u32,
    /// 输出 JPEG 质量（1..=100）。
    pub jpeg_quality: u8,
    /// 粗解码允许的像素余量倍数：粗解码像素数不超过目标像素数的该倍数。
    pub decode_pixel_headroom: u32,
    /// 模糊判定阈值（8 位灰度 Laplacian 响应最大值，小于等于即判定模糊）。
    pub blur_threshold: u8,
    /// 输出存储根目录。
    pub storage_root: PathBuf,
    /// 存储根目录下的固定子目录。
    pub output_subdir: String,
    /// 输出文件扩展名。
    pub output_extension: String,
    /// 内置资源转临时 JPEG 时使用的质量。
    pub resource_quality: u8,
    /// 源文件体积上限（字节）。
    pub max_file_size: u64,
    /// 解码阶段允许的内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 源图小于包围盒时是否允许放大到包围盒。
    pub allow_upscale: bool,
    /// 是否处理 EXIF 镜像方向（2/4/5/7）。关闭时按原样输出。
    pub mirror_aware_orientation: bool,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            long_edge: 1795,
            short_edge: 1287,
            jpeg_quality: 80,
            decode_pixel_headroom: 2,
            blur_threshold: 162,
            storage_root: default_storage_root(),
            output_subdir: "SiliCompressor/Images".to_string(),
            output_extension: "jpg".to_string(),
            resource_quality: 100,
            max_file_size: 50 * 1024 * 1024,
            max_decoded_bytes: 160 * 1024 * 1024,
            allow_upscale: true,
            mirror_aware_orientation: false,
        }
    }
}

/// 公共图片目录优先，其次用户主目录，最后系统临时目录。
fn default_storage_root() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
}

impl CompressConfig {
    /// 基于存储根目录创建配置，其余参数取默认值。
    pub fn with_storage_root(root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: root.into(),
            ..Self::default()
        }
    }

    /// 输出目录完整路径（不保证已存在）。
    pub fn output_dir(&self) -> PathBuf {
        self.storage_root.join(&self.output_subdir)
    }

    pub fn validate(&self) -> Result<(), CompressError> {
        if self.long_edge == 0 || self.short_edge == 0 {
            return Err(CompressError::InvalidSource(
                "包围盒边长必须大于 0".to_string(),
            ));
        }

        if self.short_edge > self.long_edge {
            return Err(CompressError::InvalidSource(format!(
                "包围盒短边 {} 不能大于长边 {}",
                self.short_edge, self.long_edge
            )));
        }

        for (name, quality) in [
            ("jpeg_quality", self.jpeg_quality),
            ("resource_quality", self.resource_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(CompressError::InvalidSource(format!(
                    "{} 超出范围：{}（可选：1..=100）",
                    name, quality
                )));
            }
        }

        if self.decode_pixel_headroom == 0 {
            return Err(CompressError::InvalidSource(
                "解码像素余量必须至少为 1".to_string(),
            ));
        }

        if self.output_extension.is_empty() {
            return Err(CompressError::InvalidSource("输出扩展名不能为空".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_canonical_pipeline() {
        let config = CompressConfig::default();
        assert_eq!((config.long_edge, config.short_edge), (1795, 1287));
        assert_eq!(config.jpeg_quality, 80);
        assert_eq!(config.decode_pixel_headroom, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn output_dir_joins_fixed_subdir() {
        let config = CompressConfig::with_storage_root("/sdcard");
        assert_eq!(
            config.output_dir(),
            PathBuf::from("/sdcard").join("SiliCompressor/Images")
        );
    }

    #[test]
    fn validate_rejects_out_of_range_quality() {
        let mut config = CompressConfig::default();
        config.jpeg_quality = 0;
        assert!(matches!(config.validate(), Err(CompressError::InvalidSource(_))));

        config.jpeg_quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let mut config = CompressConfig::default();
        config.short_edge = 2000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: CompressConfig =
            serde_json::from_str(r#"{ "jpeg_quality": 70, "allow_upscale": false }"#)
                .expect("parse partial config");
        assert_eq!(config.jpeg_quality, 70);
        assert!(!config.allow_upscale);
        assert_eq!(config.long_edge, 1795);
    }
}
