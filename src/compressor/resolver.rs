//! # URI 解析模块
//!
//! ## 设计思路
//!
//! 内容 URI 到文件路径的解析属于外部协作方（例如平台媒体库），
//! 核心只依赖 `ContentResolver` 这一窄接口。解析器返回 `None` 时，
//! 退化为直接使用 URI 的路径部分。
//!
//! ## 实现思路
//!
//! - `FileResolver` 是默认实现：接受 `file://` URI 与普通路径。
//! - `resolve_source_path` 统一处理“解析 → 回退”两步，并记录回退日志。

use std::path::PathBuf;

/// 将 URI 字符串解析为绝对文件路径。
pub trait ContentResolver: Send + Sync {
    /// 返回 `None` 表示解析器不认识该 URI。
    fn resolve(&self, uri: &str) -> Option<PathBuf>;
}

/// 只认识本地文件的默认解析器。
#[derive(Debug, Default, Clone, Copy)]
pub struct FileResolver;

impl ContentResolver for FileResolver {
    fn resolve(&self, uri: &str) -> Option<PathBuf> {
        let trimmed = uri.trim();
        if trimmed.is_empty() {
            return None;
        }

        match split_scheme(trimmed) {
            Some(("file", _)) => Some(PathBuf::from(uri_path_component(trimmed))),
            Some(_) => None,
            None => Some(PathBuf::from(trimmed)),
        }
    }
}

/// 解析 URI 对应的源文件路径，解析器未命中时使用 URI 路径部分。
pub fn resolve_source_path(resolver: &dyn ContentResolver, uri: &str) -> PathBuf {
    match resolver.resolve(uri) {
        Some(path) => path,
        None => {
            let fallback = uri_path_component(uri);
            log::debug!("🔎 解析器未命中，回退使用 URI 路径部分 - {} -> {}", uri, fallback);
            PathBuf::from(fallback)
        }
    }
}

/// 提取 URI 的路径部分（去掉 scheme、authority、query 与 fragment）。
///
/// 没有 scheme 的输入原样返回。
pub fn uri_path_component(uri: &str) -> String {
    let uri = uri.trim();
    let Some((_, rest)) = split_scheme(uri) else {
        return uri.to_string();
    };

    let after_authority = match rest.strip_prefix("//") {
        Some(hier) => match hier.find('/') {
            Some(index) => &hier[index..],
            None => "",
        },
        None => rest,
    };

    let end = after_authority
        .find(['?', '#'])
        .unwrap_or(after_authority.len());
    percent_decode(&after_authority[..end])
}

/// 拆分 `scheme:rest`。单字母 scheme 视为 Windows 盘符而非 URI。
fn split_scheme(uri: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = uri.split_once(':')?;
    let valid = scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some((scheme, rest))
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
