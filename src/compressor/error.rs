//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载压缩链路中“对本次请求致命”的错误来源。
//! 可降级的情况（EXIF 读取失败、解析器未命中、删除源文件失败）不进入此枚举，
//! 只在对应阶段记录日志后继续执行。

/// 压缩链路统一错误类型。
///
/// 该类型会在 crate 顶层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    /// 源字节无法识别、损坏或无法解码出有效像素。
    #[error("源图片无效：{0}")]
    InvalidSource(String),

    /// 解码或缓冲区分配超出内存限制。
    #[error("内存不足：{0}")]
    OutOfMemory(String),

    /// 源文件不存在或无法读取。
    #[error("文件错误：{0}")]
    FileSystem(String),

    /// 输出目录或目标文件无法创建/写入。
    #[error("输出位置不可用：{0}")]
    DestinationUnavailable(String),

    #[error("编码错误：{0}")]
    Encode(String),

    /// 后台任务异常退出（panic 或被取消）。
    #[error("后台任务失败：{0}")]
    Task(String),
}

impl CompressError {
    /// 稳定错误码，供外壳输出结构化结果。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSource(_) => "invalid_source",
            Self::OutOfMemory(_) => "out_of_memory",
            Self::FileSystem(_) => "file_system",
            Self::DestinationUnavailable(_) => "destination_unavailable",
            Self::Encode(_) => "encode",
            Self::Task(_) => "task",
        }
    }

    /// 是否属于“没有可用源缓冲”的失败路径。
    ///
    /// 调用侧需要区分它与输出位置写入失败。
    pub fn is_missing_buffer(&self) -> bool {
        matches!(self, Self::InvalidSource(_) | Self::OutOfMemory(_))
    }
}

impl From<image::ImageError> for CompressError {
    fn from(error: image::ImageError) -> Self {
        match error {
            image::ImageError::Limits(limit) => {
                Self::OutOfMemory(format!("解码超出限制：{}", limit))
            }
            image::ImageError::IoError(io) => Self::FileSystem(format!("读取图片失败：{}", io)),
            other => Self::InvalidSource(format!("图片解码失败：{}", other)),
        }
    }
}
