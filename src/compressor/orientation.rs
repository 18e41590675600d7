//! # 方向校正模块
//!
//! 从源文件（而非像素缓冲）读取 EXIF 方向标签，对已缩放缓冲做纯几何旋转。
//! 读取失败不影响主流程：记录日志后按“无需旋转”处理。

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::imageops;

use super::source::PixelBuffer;

/// 识别出的方向变换。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationTag {
    Identity,
    Rotate90,
    Rotate180,
    Rotate270,
    /// 以下镜像变体仅在开启 `mirror_aware_orientation` 时出现。
    FlipHorizontal,
    FlipVertical,
    Transpose,
    Transverse,
}

impl OrientationTag {
    /// 将 EXIF 方向值映射为变换。
    ///
    /// 默认只识别 6/3/8，其余值（含镜像 2/4/5/7、0 与缺失）均视为 `Identity`。
    pub fn from_exif(value: u32, mirror_aware: bool) -> Self {
        match (value, mirror_aware) {
            (6, _) => Self::Rotate90,
            (3, _) => Self::Rotate180,
            (8, _) => Self::Rotate270,
            (2, true) => Self::FlipHorizontal,
            (4, true) => Self::FlipVertical,
            (5, true) => Self::Transpose,
            (7, true) => Self::Transverse,
            _ => Self::Identity,
        }
    }

    /// 应用变换，返回新缓冲；`Identity` 直接交还原缓冲。
    pub fn apply(self, buffer: PixelBuffer) -> PixelBuffer {
        match self {
            Self::Identity => buffer,
            Self::Rotate90 => imageops::rotate90(&buffer),
            Self::Rotate180 => imageops::rotate180(&buffer),
            Self::Rotate270 => imageops::rotate270(&buffer),
            Self::FlipHorizontal => imageops::flip_horizontal(&buffer),
            Self::FlipVertical => imageops::flip_vertical(&buffer),
            Self::Transpose => imageops::flip_horizontal(&imageops::rotate90(&buffer)),
            Self::Transverse => imageops::flip_horizontal(&imageops::rotate270(&buffer)),
        }
    }
}

/// 读取源文件的 EXIF 方向标签。
///
/// 文件无法打开或 EXIF 缺失/损坏时返回 `Identity`。
pub fn read_orientation(path: &Path, mirror_aware: bool) -> OrientationTag {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            log::warn!("⚠️ 无法打开源文件读取 EXIF，按原方向处理：{}", err);
            return OrientationTag::Identity;
        }
    };

    let mut reader = BufReader::new(file);
    let value = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .unwrap_or(0),
        Err(exif::Error::NotFound(_)) => 0,
        Err(err) => {
            log::warn!("⚠️ EXIF 读取失败，按原方向处理：{}", err);
            0
        }
    };

    let tag = OrientationTag::from_exif(value, mirror_aware);
    log::debug!("🧭 EXIF 方向：{} -> {:?}", value, tag);
    tag
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn marked_buffer(width: u32, height: u32) -> PixelBuffer {
        let mut buffer = PixelBuffer::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        buffer.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        buffer
    }

    #[test]
    fn known_codes_map_to_rotations() {
        assert_eq!(OrientationTag::from_exif(6, false), OrientationTag::Rotate90);
        assert_eq!(OrientationTag::from_exif(3, false), OrientationTag::Rotate180);
        assert_eq!(OrientationTag::from_exif(8, false), OrientationTag::Rotate270);
        for code in [0, 1, 2, 4, 5, 7, 9] {
            assert_eq!(OrientationTag::from_exif(code, false), OrientationTag::Identity);
        }
    }

    #[test]
    fn mirror_codes_need_opt_in() {
        assert_eq!(OrientationTag::from_exif(2, true), OrientationTag::FlipHorizontal);
        assert_eq!(OrientationTag::from_exif(5, true), OrientationTag::Transpose);
        assert_eq!(
            OrientationTag::Transverse.apply(marked_buffer(40, 30)).dimensions(),
            (30, 40)
        );
    }

    #[test]
    fn rotate90_swaps_dimensions() {
        let rotated = OrientationTag::Rotate90.apply(marked_buffer(1346, 1795));
        assert_eq!(rotated.dimensions(), (1795, 1346));
        // 左上角旋转 90° 后落到右上角
        assert_eq!(rotated.get_pixel(1794, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn rotate270_swaps_dimensions() {
        let tag = OrientationTag::from_exif(8, false);
        let rotated = tag.apply(marked_buffer(40, 30));
        assert_eq!(rotated.dimensions(), (30, 40));
        // 左上角逆时针旋转后落到左下角
        assert_eq!(rotated.get_pixel(0, 39), &Rgba([255, 0, 0, 255]));
        assert_eq!(rotated.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn rotate180_keeps_dimensions() {
        let rotated = OrientationTag::Rotate180.apply(marked_buffer(40, 30));
        assert_eq!(rotated.dimensions(), (40, 30));
        assert_eq!(rotated.get_pixel(39, 29), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn identity_is_a_no_op() {
        let buffer = marked_buffer(40, 30);
        assert_eq!(OrientationTag::Identity.apply(buffer.clone()), buffer);
    }

    #[test]
    fn unreadable_file_defaults_to_identity() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.jpg");
        assert_eq!(read_orientation(&missing, false), OrientationTag::Identity);

        let png = dir.path().join("plain.png");
        PixelBuffer::from_pixel(4, 4, Rgba([1, 2, 3, 255]))
            .save(&png)
            .expect("save png");
        assert_eq!(read_orientation(&png, false), OrientationTag::Identity);
    }
}
