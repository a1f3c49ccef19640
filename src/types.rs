// src/types.rs - 核心数据类型

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wi-Fi 加密协议，对应配置串中的 `T:` 字段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EncryptionProtocol {
    #[default]
    Wpa2,
    Wpa,
    Wep,
    None,
}

impl EncryptionProtocol {
    /// 选择列表中的顺序
    pub const ALL: [EncryptionProtocol; 4] = [
        EncryptionProtocol::Wpa2,
        EncryptionProtocol::Wpa,
        EncryptionProtocol::Wep,
        EncryptionProtocol::None,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EncryptionProtocol::Wpa2 => "WPA2",
            EncryptionProtocol::Wpa => "WPA",
            EncryptionProtocol::Wep => "WEP",
            EncryptionProtocol::None => "NONE",
        }
    }

    /// 配置串里使用的代码
    pub fn code(self) -> &'static str {
        match self {
            EncryptionProtocol::None => "nopass",
            other => other.name(),
        }
    }

    pub fn needs_key(self) -> bool {
        !matches!(self, EncryptionProtocol::None)
    }
}

impl fmt::Display for EncryptionProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EncryptionProtocol {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // "nopass" 和空串都表示开放网络
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nopass") {
            return Ok(EncryptionProtocol::None);
        }
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseError::UnknownProtocol(s.to_string()))
    }
}

impl TryFrom<String> for EncryptionProtocol {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EncryptionProtocol> for String {
    fn from(p: EncryptionProtocol) -> Self {
        p.name().to_string()
    }
}

/// 单个网络的连接参数，每次运行构造一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub ssid: String,
    pub key: String,
    pub protocol: EncryptionProtocol,
    pub hidden: bool,
}

impl Configuration {
    pub fn new(
        ssid: impl Into<String>,
        key: impl Into<String>,
        protocol: EncryptionProtocol,
        hidden: bool,
    ) -> Self {
        Self {
            ssid: ssid.into(),
            key: key.into(),
            protocol,
            hidden,
        }
    }
}
