//! # 尺寸规划模块
//!
//! ## 设计思路
//!
//! 纯计算、无 I/O：只依据原始宽高决定包围盒、目标尺寸与粗解码的整数降采样倍数。
//! 所有后续阶段都从同一份 `ScalePlan` 取参数，避免各阶段重复推导。
//!
//! ## 实现思路
//!
//! 1. 按横竖方向选择包围盒（竖图 1287×1795、横图 1795×1287、方图 1795×1795）
//! 2. 比较高度比与宽度比，以占主导的一边贴合包围盒，另一边按原始比例取整
//! 3. 以“取整比例的较小值”作为初始倍数，再递增直到粗解码像素数不超过目标像素数的余量倍数

use super::CompressConfig;

/// 单次压缩请求的尺寸规划，创建后不再修改。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalePlan {
    /// 包围盒宽度。
    pub bound_width: u32,
    /// 包围盒高度。
    pub bound_height: u32,
    /// 最终输出宽度（≥1）。
    pub target_width: u32,
    /// 最终输出高度（≥1）。
    pub target_height: u32,
    /// 粗解码整数降采样倍数（≥1，不要求是 2 的幂）。
    pub downsample_factor: u32,
}

/// 根据方向选择包围盒，返回 `(宽, 高)`。
pub fn bounding_box(native_width: u32, native_height: u32, config: &CompressConfig) -> (u32, u32) {
    let (long, short) = (config.long_edge, config.short_edge);
    match native_height.cmp(&native_width) {
        std::cmp::Ordering::Greater => (short, long),
        std::cmp::Ordering::Less => (long, short),
        std::cmp::Ordering::Equal => (long, long),
    }
}

/// 计算完整的缩放规划。
///
/// 调用方需保证 `native_width`、`native_height` 均大于 0。
pub fn plan(native_width: u32, native_height: u32, config: &CompressConfig) -> ScalePlan {
    let (bound_width, bound_height) = bounding_box(native_width, native_height, config);

    let img_ratio = native_height as f64 / native_width as f64;
    let height_ratio = native_height as f64 / bound_height as f64;
    let width_ratio = native_width as f64 / bound_width as f64;

    let (mut target_width, mut target_height) = if height_ratio > width_ratio {
        (bound_width, round_dimension(bound_width as f64 * img_ratio))
    } else if height_ratio < width_ratio {
        (round_dimension(bound_height as f64 / img_ratio), bound_height)
    } else {
        (bound_width, bound_height)
    };

    if !config.allow_upscale && (target_width > native_width || target_height > native_height) {
        let shrink = (native_width as f64 / target_width as f64)
            .min(native_height as f64 / target_height as f64);
        target_width = round_dimension(target_width as f64 * shrink).min(native_width);
        target_height = round_dimension(target_height as f64 * shrink).min(native_height);
    }

    let downsample_factor = calculate_in_sample_size(
        native_width,
        native_height,
        target_width,
        target_height,
        config.decode_pixel_headroom,
    );

    ScalePlan {
        bound_width,
        bound_height,
        target_width,
        target_height,
        downsample_factor,
    }
}

/// 计算粗解码的整数降采样倍数。
///
/// 保证 `native_pixels / factor² <= target_pixels * headroom`。
pub fn calculate_in_sample_size(
    native_width: u32,
    native_height: u32,
    target_width: u32,
    target_height: u32,
    headroom: u32,
) -> u32 {
    let mut factor: u64 = 1;

    if native_height > target_height || native_width > target_width {
        let height_ratio = (native_height as f64 / target_height as f64).round() as u64;
        let width_ratio = (native_width as f64 / target_width as f64).round() as u64;
        factor = height_ratio.min(width_ratio).max(1);
    }

    let total_pixels = native_width as u64 * native_height as u64;
    let pixel_cap = target_width as u64 * target_height as u64 * headroom.max(1) as u64;
    while total_pixels > pixel_cap * factor * factor {
        factor += 1;
    }

    factor.min(u32::MAX as u64) as u32
}

fn round_dimension(value: f64) -> u32 {
    (value.round() as u32).max(1)
}
