//! # 图片压缩模块（compressor）
//!
//! ## 设计思路
//!
//! 该模块将“尺寸规划 → 降采样解码 → 精确缩放 → 方向校正 → 编码落盘”
//! 以及独立的“模糊检测”按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `service`：调用侧异步派发（tokio 阻塞线程池）
//! - `handler`：编排整条压缩链路，持有注入上下文
//! - `planner`：包围盒、目标尺寸与降采样倍数（纯计算）
//! - `decoder`：边界探测与降采样解码
//! - `rescaler`：中心对齐的精确缩放
//! - `orientation`：EXIF 方向读取与旋转
//! - `encoder`：JPEG 编码与输出文件
//! - `blur`：Laplacian 模糊判定
//! - `resolver`：URI → 文件路径
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! 调用方（应用外壳）
//!    ↓
//! service.rs（spawn_blocking，整请求派发）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ resolver.rs（URI 解析，未命中回退路径部分）
//!    ├─ decoder.rs（签名校验 + 头部尺寸）
//!    ├─ planner.rs（ScalePlan）
//!    ├─ decoder.rs（DCT 缩放 / 受限解码）
//!    ├─ rescaler.rs（双线性精确缩放）
//!    ├─ orientation.rs（EXIF 6/3/8 → 旋转）
//!    └─ encoder.rs（质量 80 JPEG → <毫秒>.jpg）
//!    ↓
//! 返回 CompressedImage / CompressError
//! ```

mod blur;
mod config;
mod decoder;
mod encoder;
mod error;
mod handler;
mod orientation;
mod planner;
mod rescaler;
mod resolver;
mod service;
mod source;

pub use blur::{
    BlurKind, BlurVerdict, DEFAULT_BLUR_THRESHOLD, PACKED_BLUR_THRESHOLD, classify_blur, laplacian,
    pack_gray,
};
pub use config::CompressConfig;
pub use decoder::{decode_full, decode_subsampled, probe_dimensions};
pub use encoder::{encode_jpeg, write_compressed};
pub use error::CompressError;
pub use handler::{Compressor, CompressorContext};
pub use orientation::{OrientationTag, read_orientation};
pub use planner::{ScalePlan, bounding_box, calculate_in_sample_size, plan};
pub use rescaler::rescale_to_target;
pub use resolver::{ContentResolver, FileResolver, resolve_source_path, uri_path_component};
pub use service::CompressorService;
pub use source::{CompressedImage, PixelBuffer, SourceImage};
