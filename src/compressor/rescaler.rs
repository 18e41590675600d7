//! # 精确缩放模块
//!
//! ## 设计思路
//!
//! 粗解码只保证“不超过目标像素数的余量倍数”，这里再把它精确缩放到规划的目标宽高。
//! 变换以目标缓冲中心为支点、以源缓冲中心对齐，等价于把源矩形完整映射到目标矩形
//! （源中心 → 目标中心，源角点 → 目标角点），因此可以直接交给 `fast_image_resize`
//! 的双线性卷积完成。
//!
//! ## 实现思路
//!
//! 1. 以可失败的方式预留目标缓冲，分配失败降级为 `OutOfMemory`
//! 2. 双线性滤波执行缩放，源缓冲在此阶段结束时释放

use fast_image_resize as fr;

use super::planner::ScalePlan;
use super::source::PixelBuffer;
use super::CompressError;

const BYTES_PER_PIXEL: u64 = 4;

/// 将粗解码缓冲精确缩放到规划尺寸。
pub fn rescale_to_target(
    coarse: PixelBuffer,
    plan: &ScalePlan,
    max_bytes: u64,
) -> Result<PixelBuffer, CompressError> {
    let (src_width, src_height) = coarse.dimensions();
    let (target_width, target_height) = (plan.target_width, plan.target_height);

    if (src_width, src_height) == (target_width, target_height) {
        return Ok(coarse);
    }

    log::debug!(
        "📏 精确缩放：{}x{} -> {}x{}（ratio={:.4}x{:.4}）",
        src_width,
        src_height,
        target_width,
        target_height,
        target_width as f64 / src_width as f64,
        target_height as f64 / src_height as f64
    );

    let destination = allocate_destination(target_width, target_height, max_bytes)?;
    let mut dst = fr::images::Image::from_vec_u8(
        target_width,
        target_height,
        destination,
        fr::PixelType::U8x4,
    )
    .map_err(|e| CompressError::OutOfMemory(format!("构建目标缓冲失败：{}", e)))?;

    let src = fr::images::Image::from_vec_u8(
        src_width,
        src_height,
        coarse.into_raw(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| CompressError::InvalidSource(format!("构建源图像缓冲失败：{}", e)))?;

    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear));
    let mut resizer = fr::Resizer::new();
    resizer
        .resize(&src, &mut dst, Some(&options))
        .map_err(|e| CompressError::InvalidSource(format!("精确缩放执行失败：{}", e)))?;

    PixelBuffer::from_raw(target_width, target_height, dst.into_vec())
        .ok_or_else(|| CompressError::InvalidSource("缩放输出缓冲长度异常".to_string()))
}

/// 预留 `width * height * 4` 字节的零初始化缓冲。
fn allocate_destination(width: u32, height: u32, max_bytes: u64) -> Result<Vec<u8>, CompressError> {
    let bytes = (width as u64)
        .checked_mul(height as u64)
        .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
        .ok_or_else(|| CompressError::OutOfMemory("目标缓冲尺寸溢出".to_string()))?;

    if bytes > max_bytes {
        return Err(CompressError::OutOfMemory(format!(
            "目标缓冲过大：{:.2} MB（限制：{:.2} MB）",
            bytes as f64 / 1024.0 / 1024.0,
            max_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    let len = usize::try_from(bytes)
        .map_err(|_| CompressError::OutOfMemory("目标缓冲超出地址空间".to_string()))?;
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|e| CompressError::OutOfMemory(format!("目标缓冲分配失败：{}", e)))?;
    buffer.resize(len, 0);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn plan(target_width: u32, target_height: u32) -> ScalePlan {
        ScalePlan {
            bound_width: target_width,
            bound_height: target_height,
            target_width,
            target_height,
            downsample_factor: 1,
        }
    }

    #[test]
    fn rescale_produces_exact_target_dimensions() {
        let coarse = PixelBuffer::from_pixel(2000, 1500, Rgba([10, 20, 30, 255]));
        let result = rescale_to_target(coarse, &plan(1795, 1346), u64::MAX).expect("rescale");

        assert_eq!(result.dimensions(), (1795, 1346));
        assert_eq!(result.get_pixel(900, 600), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn rescale_maps_edges_to_edges() {
        let coarse = PixelBuffer::from_fn(200, 100, |x, _| {
            if x < 100 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 255]) }
        });
        let result = rescale_to_target(coarse, &plan(180, 90), u64::MAX).expect("rescale");

        assert_eq!(result.get_pixel(0, 45), &Rgba([255, 0, 0, 255]));
        assert_eq!(result.get_pixel(179, 45), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn rescale_can_enlarge() {
        let coarse = PixelBuffer::from_pixel(100, 100, Rgba([200, 100, 50, 255]));
        let result = rescale_to_target(coarse, &plan(180, 180), u64::MAX).expect("rescale");
        assert_eq!(result.dimensions(), (180, 180));
    }

    #[test]
    fn matching_size_is_passed_through() {
        let coarse = PixelBuffer::from_pixel(64, 48, Rgba([1, 2, 3, 255]));
        let result = rescale_to_target(coarse.clone(), &plan(64, 48), u64::MAX).expect("rescale");
        assert_eq!(result, coarse);
    }

    #[test]
    fn oversized_target_degrades_to_out_of_memory() {
        let coarse = PixelBuffer::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let result = rescale_to_target(coarse, &plan(1000, 1000), 1024);
        assert!(matches!(result, Err(CompressError::OutOfMemory(_))));
    }
}
