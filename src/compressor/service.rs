//! # 服务层（调用侧异步派发）
//!
//! ## 设计思路
//!
//! 核心链路是同步计算，可能耗时数秒。`CompressorService` 在调用侧把每个请求整体
//! 派发到 tokio 阻塞线程池，避免占用交互线程；核心本身不感知线程。
//!
//! ## 实现思路
//!
//! - 内部只持有 `Arc<Compressor>`，多个请求并发时不共享任何缓冲。
//! - 不支持中途取消：调用方丢弃 future 后，已在执行的请求仍会跑完。

use std::sync::Arc;

use image::DynamicImage;

use super::blur::BlurVerdict;
use super::source::CompressedImage;
use super::{CompressError, Compressor, CompressorContext};

/// 图片压缩服务。
#[derive(Debug, Clone)]
pub struct CompressorService {
    compressor: Arc<Compressor>,
}

impl CompressorService {
    /// # 示例
    /// ```rust,no_run
    /// use image_compressor::compressor::{CompressorContext, CompressorService};
    ///
    /// # async fn demo() -> Result<(), image_compressor::compressor::CompressError> {
    /// let service = CompressorService::new(CompressorContext::default())?;
    /// let result = service.compress("file:///tmp/photo.jpg".to_string()).await?;
    /// println!("{}", result.path.display());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(context: CompressorContext) -> Result<Self, CompressError> {
        Ok(Self {
            compressor: Arc::new(Compressor::new(context)?),
        })
    }

    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    pub async fn compress(&self, uri: String) -> Result<CompressedImage, CompressError> {
        self.run(move |compressor| compressor.compress(&uri)).await
    }

    pub async fn compress_and_delete_source(
        &self,
        uri: String,
    ) -> Result<CompressedImage, CompressError> {
        self.run(move |compressor| compressor.compress_and_delete_source(&uri))
            .await
    }

    pub async fn compress_resource(
        &self,
        bytes: Vec<u8>,
    ) -> Result<CompressedImage, CompressError> {
        self.run(move |compressor| compressor.compress_resource(&bytes))
            .await
    }

    pub async fn compress_to_buffer(
        &self,
        uri: String,
        delete_source: bool,
    ) -> Result<DynamicImage, CompressError> {
        self.run(move |compressor| compressor.compress_to_buffer(&uri, delete_source))
            .await
    }

    pub async fn image_quality(&self, uri: String) -> Result<BlurVerdict, CompressError> {
        self.run(move |compressor| compressor.image_quality(&uri))
            .await
    }

    /// 在阻塞线程池上执行单个完整请求。
    async fn run<T, F>(&self, job: F) -> Result<T, CompressError>
    where
        T: Send + 'static,
        F: FnOnce(&Compressor) -> Result<T, CompressError> + Send + 'static,
    {
        let compressor = Arc::clone(&self.compressor);
        tokio::task::spawn_blocking(move || job(&compressor))
            .await
            .map_err(|e| CompressError::Task(format!("压缩任务异常退出：{}", e)))?
    }
}
