//! # 模糊检测模块
//!
//! ## 设计思路
//!
//! 对原始分辨率图像做灰度化与 3×3 Laplacian 边缘响应，取响应最大值与固定阈值比较：
//! 最大响应不超过阈值即判定为模糊。与压缩链路完全独立。
//!
//! ## 实现思路
//!
//! - 边缘响应为 8 位单通道，负值截断为 0、超过 255 截断为 255。
//! - 边界按 reflect-101 镜像取邻域（`-1 → 1`、`n → n-2`），边缘像素与内部像素一样参与统计，
//!   因此宽或高不超过 2 的小图也能得到真实响应。
//! - 历史阈值以“不透明灰度像素按 ARGB 打包后的有符号 32 位整数”表示（`-6118750`），
//!   它恰好等于灰度 162。这里直接在灰度空间比较，打包值仅随结果输出，二者判定等价。
//! - 灰度化使用 `to_luma8`（Rec.709 权重）。历史实现把 RGBA 缓冲按 BGR 顺序转灰度，
//!   相当于 Rec.601 权重且 R/B 互换；彩色图在阈值 162 附近的判定可能与历史结果不同，
//!   纯灰度图不受影响。

use std::fmt;

use image::{DynamicImage, GrayImage, Luma};

/// 历史打包阈值：`0xFFA2A2A2` 的有符号解释。
pub const PACKED_BLUR_THRESHOLD: i32 = -6_118_750;

/// 与 `PACKED_BLUR_THRESHOLD` 等价的灰度阈值。
pub const DEFAULT_BLUR_THRESHOLD: u8 = 162;

const LAPLACIAN_KERNEL: [[i32; 3]; 3] = [[0, 1, 0], [1, -4, 1], [0, 1, 0]];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurKind {
    Blurry,
    Sharp,
}

/// 模糊判定结果，附带诊断用的锐度统计。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurVerdict {
    pub kind: BlurKind,
    /// Laplacian 响应最大值（0..=255）。
    pub max_response: u8,
    /// 最大值按不透明 ARGB 打包后的有符号值。
    pub packed_max: i32,
    /// 本次使用的灰度阈值。
    pub threshold: u8,
}

impl BlurVerdict {
    pub fn is_blurry(&self) -> bool {
        self.kind == BlurKind::Blurry
    }

    pub fn as_str(&self) -> &'static str {
        match self.kind {
            BlurKind::Blurry => "blur image",
            BlurKind::Sharp => "Not a blur image",
        }
    }
}

impl fmt::Display for BlurVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 将灰度值打包为不透明 ARGB 像素，并按有符号 32 位解释。
pub fn pack_gray(value: u8) -> i32 {
    let v = value as u32;
    (0xFF00_0000 | (v << 16) | (v << 8) | v) as i32
}

/// 计算 8 位 Laplacian 边缘响应图，边界按 reflect-101 取邻域。
pub fn laplacian(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();

    GrayImage::from_fn(width, height, |x, y| {
        let mut sum = 0i32;
        for (ky, row) in LAPLACIAN_KERNEL.iter().enumerate() {
            let sy = reflect_101(y as i64 + ky as i64 - 1, height);
            for (kx, &weight) in row.iter().enumerate() {
                if weight == 0 {
                    continue;
                }
                let sx = reflect_101(x as i64 + kx as i64 - 1, width);
                sum += weight * gray.get_pixel(sx, sy).0[0] as i32;
            }
        }
        Luma([sum.clamp(0, 255) as u8])
    })
}

/// 越界坐标按边缘像素镜像（不重复边缘本身）。
fn reflect_101(index: i64, len: u32) -> u32 {
    let len = len as i64;
    if len == 1 {
        return 0;
    }
    let reflected = if index < 0 {
        -index
    } else if index >= len {
        2 * len - 2 - index
    } else {
        index
    };
    reflected.clamp(0, len - 1) as u32
}

/// 对原始图像执行模糊判定。
pub fn classify_blur(image: &DynamicImage, threshold: u8) -> BlurVerdict {
    let gray = image.to_luma8();
    let response = laplacian(&gray);
    let max_response = response.pixels().map(|p| p.0[0]).max().unwrap_or(0);

    let kind = if max_response <= threshold {
        BlurKind::Blurry
    } else {
        BlurKind::Sharp
    };

    log::debug!(
        "🔍 模糊检测：{}x{} 最大响应={} 打包值={} 阈值={} -> {:?}",
        gray.width(),
        gray.height(),
        max_response,
        pack_gray(max_response),
        threshold,
        kind
    );

    BlurVerdict {
        kind,
        max_response,
        packed_max: pack_gray(max_response),
        threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn checkerboard(size: u32, cell: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_fn(size, size, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        }))
    }

    #[test]
    fn packed_threshold_equals_gray_162() {
        assert_eq!(pack_gray(DEFAULT_BLUR_THRESHOLD), PACKED_BLUR_THRESHOLD);
        assert_eq!(pack_gray(0), -16_777_216);
        // 打包是单调的，灰度比较与打包比较等价
        assert!(pack_gray(163) > PACKED_BLUR_THRESHOLD);
        assert!(pack_gray(161) < PACKED_BLUR_THRESHOLD);
    }

    #[test]
    fn flat_image_is_blurry() {
        let flat = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(64, 48, Rgba([120, 80, 40, 255])));
        let verdict = classify_blur(&flat, DEFAULT_BLUR_THRESHOLD);

        assert!(verdict.is_blurry());
        assert_eq!(verdict.max_response, 0);
        assert_eq!(verdict.to_string(), "blur image");
    }

    #[test]
    fn checkerboard_is_sharp() {
        let verdict = classify_blur(&checkerboard(64, 8), DEFAULT_BLUR_THRESHOLD);

        assert!(!verdict.is_blurry());
        assert_eq!(verdict.max_response, 255);
        assert_eq!(verdict.to_string(), "Not a blur image");
    }

    #[test]
    fn gentle_gradient_is_blurry() {
        let gradient = DynamicImage::ImageLuma8(ImageBuffer::from_fn(128, 32, |x, _| {
            image::Luma([(x * 2) as u8])
        }));
        assert!(classify_blur(&gradient, DEFAULT_BLUR_THRESHOLD).is_blurry());
    }

    #[test]
    fn narrow_checkerboard_is_sharp() {
        let strip = DynamicImage::ImageLuma8(GrayImage::from_fn(2, 6, |x, y| {
            if (x + y) % 2 == 0 { Luma([255]) } else { Luma([0]) }
        }));
        let verdict = classify_blur(&strip, DEFAULT_BLUR_THRESHOLD);
        assert_eq!(verdict.max_response, 255);
        assert_eq!(verdict.to_string(), "Not a blur image");
    }

    #[test]
    fn detail_on_corner_is_detected() {
        let mut gray = GrayImage::from_pixel(16, 16, Luma([0]));
        gray.put_pixel(0, 0, Luma([255]));

        let response = laplacian(&gray);
        // (1,0) 的左邻是白点，上邻镜像到 (1,1)
        assert_eq!(response.get_pixel(1, 0), &Luma([255]));
        assert_eq!(response.get_pixel(0, 1), &Luma([255]));
        assert_eq!(response.get_pixel(0, 0), &Luma([0]));

        let verdict = classify_blur(&DynamicImage::ImageLuma8(gray), DEFAULT_BLUR_THRESHOLD);
        assert!(!verdict.is_blurry());
    }

    #[test]
    fn single_pixel_image_is_blurry() {
        let dot = DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([255])));
        assert!(classify_blur(&dot, DEFAULT_BLUR_THRESHOLD).is_blurry());
    }

    #[test]
    fn laplacian_keeps_dimensions() {
        let gray = checkerboard(20, 4).to_luma8();
        assert_eq!(laplacian(&gray).dimensions(), (20, 20));
    }
}
