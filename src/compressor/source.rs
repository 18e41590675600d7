//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入”和“流水线中间结果”解耦：
//! - `SourceImage` 表示已探测尺寸、尚未解码的源文件
//! - `PixelBuffer` 表示各阶段独占的 RGBA 像素缓冲
//! - `CompressedImage` 表示已写入磁盘的最终结果

use std::path::PathBuf;

use image::{ImageFormat, RgbaImage};

/// 阶段间传递的像素缓冲，固定为 8 位 RGBA。
///
/// 每个阶段按值接收并返回，所有权随流水线转移。
pub type PixelBuffer = RgbaImage;

/// 仅做边界探测后的源图片。
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// 源文件路径（流水线只引用，不拥有该文件）。
    pub path: PathBuf,
    /// 原始宽度（像素）。
    pub native_width: u32,
    /// 原始高度（像素）。
    pub native_height: u32,
    /// 由文件头推断的编码格式。
    pub format: ImageFormat,
}

impl SourceImage {
    pub fn is_jpeg(&self) -> bool {
        self.format == ImageFormat::Jpeg
    }
}

/// 压缩结果：编码字节与写入路径。
#[derive(Debug, Clone)]
pub struct CompressedImage {
    /// 目标文件绝对路径。
    pub path: PathBuf,
    /// 写入的 JPEG 字节。
    pub bytes: Vec<u8>,
    /// 输出宽度（已应用方向校正）。
    pub width: u32,
    /// 输出高度（已应用方向校正）。
    pub height: u32,
}

impl CompressedImage {
    /// 以字符串形式返回路径，供外壳层输出。
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}
