// src/config.rs - 配置文件加载，命令行参数优先

use crate::qr::ErrorCorrection;
use crate::types::EncryptionProtocol;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// 未指定 --protocol 时使用的加密协议
    pub protocol: EncryptionProtocol,
    /// PNG 边长（像素）
    pub size: u32,
    /// 二维码纠错等级 (L, M, Q, H)
    pub error_correction: ErrorCorrection,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            protocol: EncryptionProtocol::Wpa2,
            size: 256,
            error_correction: ErrorCorrection::High,
        }
    }
}

impl Settings {
    /// 按优先级查找并加载配置文件，找不到则用默认值
    pub fn load() -> Result<Self> {
        for path in config_candidates() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        debug!("no settings file found, using defaults");
        Ok(Settings::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read settings file {}", path.display()))?;
        let settings = Self::parse(&text)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        debug!(path = %path.display(), ?settings, "settings loaded");
        Ok(settings)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

fn config_candidates() -> Vec<PathBuf> {
    let mut v = vec![];
    // 同目录下的 config.toml
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            v.push(dir.join("config.toml"));
        }
    }
    // ~/.config/wifiqr/config.toml
    if let Some(dir) = dirs::config_dir() {
        v.push(dir.join("wifiqr").join("config.toml"));
    }
    v
}
