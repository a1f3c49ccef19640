// src/error.rs - 各模块的错误类型，main.rs 统一包成 anyhow

use std::path::PathBuf;
use thiserror::Error;

/// 文本无法解析为协议或纠错等级
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown encryption protocol {0:?} (expected WPA2, WPA, WEP or NONE)")]
    UnknownProtocol(String),
    #[error("unknown error correction level {0:?} (expected L, M, Q or H)")]
    UnknownErrorCorrection(String),
}

/// 输入校验失败；交互提示会显示原因并要求重新输入
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("SSID must not be empty")]
    EmptySsid,
    #[error("SSID is {0} bytes long, at most 32 are allowed")]
    SsidTooLong(usize),
    #[error("key must not be empty for a protected network")]
    EmptyKey,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("payload of {0} bytes does not fit in a QR code at this error correction level")]
    TooLong(usize),
    #[error("QR encoding failed: {0}")]
    Other(qrcode::types::QrError),
}

/// PNG 输出失败；编码在写盘之前完成，任一失败都不会留下文件
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot encode PNG for {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
