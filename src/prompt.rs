// src/prompt.rs - 交互式补全缺失或无效的网络参数

use crate::error::ValidationError;
use crate::types::{Configuration, EncryptionProtocol};
use anyhow::{Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use tracing::{info, warn};

/// 802.11 允许的 SSID 最大字节数
pub const MAX_SSID_BYTES: usize = 32;

pub type Validator<'a> = &'a dyn Fn(&str) -> Result<(), ValidationError>;

/// 阻塞式终端输入
pub trait Prompter {
    /// 读一行文本，`validate` 通过前反复询问
    fn text(&mut self, label: &str, validate: Validator<'_>) -> Result<String>;
    /// 从列表中选一项，返回下标
    fn select(&mut self, label: &str, options: &[&str]) -> Result<usize>;
}

#[derive(Default)]
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl Prompter for TerminalPrompter {
    fn text(&mut self, label: &str, validate: Validator<'_>) -> Result<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(label)
            .allow_empty(true)
            .validate_with(|v: &String| validate(v.as_str()))
            .interact_text()
            .context("failed to read input")
    }

    fn select(&mut self, label: &str, options: &[&str]) -> Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(label)
            .items(options)
            .default(0)
            .interact()
            .context("failed to read selection")
    }
}

// ── Validators ──────────────────────────────────────────────

pub fn validate_ssid(ssid: &str) -> Result<(), ValidationError> {
    if ssid.is_empty() {
        Err(ValidationError::EmptySsid)
    } else if ssid.len() > MAX_SSID_BYTES {
        Err(ValidationError::SsidTooLong(ssid.len()))
    } else {
        Ok(())
    }
}

pub fn validate_key(protocol: EncryptionProtocol, key: &str) -> Result<(), ValidationError> {
    if key.is_empty() && protocol.needs_key() {
        Err(ValidationError::EmptyKey)
    } else {
        Ok(())
    }
}

// ── Resolution ──────────────────────────────────────────────

/// 命令行传入的原始值
#[derive(Debug, Default, Clone)]
pub struct Requested {
    pub ssid: Option<String>,
    pub key: Option<String>,
    pub protocol: Option<String>,
    pub hidden: bool,
}

/// 补全所有缺失或无效的字段，必要时交互询问
///
/// 先确定协议：是否需要密码取决于它
pub fn resolve(
    requested: Requested,
    default_protocol: EncryptionProtocol,
    prompter: &mut dyn Prompter,
) -> Result<Configuration> {
    let protocol = resolve_protocol(requested.protocol.as_deref(), default_protocol, prompter)?;

    let ssid = match requested.ssid {
        Some(s) => match validate_ssid(&s) {
            Ok(()) => s,
            Err(e) => {
                warn!("{e}");
                prompt_ssid(prompter)?
            }
        },
        None => prompt_ssid(prompter)?,
    };

    let key = match requested.key {
        Some(k) => match validate_key(protocol, &k) {
            Ok(()) => k,
            Err(e) => {
                warn!("{e}");
                prompt_key(protocol, prompter)?
            }
        },
        None if !protocol.needs_key() => String::new(),
        None => prompt_key(protocol, prompter)?,
    };

    Ok(Configuration::new(ssid, key, protocol, requested.hidden))
}

fn resolve_protocol(
    requested: Option<&str>,
    default: EncryptionProtocol,
    prompter: &mut dyn Prompter,
) -> Result<EncryptionProtocol> {
    let Some(text) = requested else {
        return Ok(default);
    };
    match text.parse::<EncryptionProtocol>() {
        Ok(p) => Ok(p),
        Err(e) => {
            warn!("{e}");
            let names = EncryptionProtocol::ALL.map(EncryptionProtocol::name);
            let idx = prompter.select("Encryption protocol", &names)?;
            let protocol = *EncryptionProtocol::ALL
                .get(idx)
                .context("selection out of range")?;
            info!(%protocol, "protocol selected");
            Ok(protocol)
        }
    }
}

fn prompt_ssid(prompter: &mut dyn Prompter) -> Result<String> {
    prompter.text("Network name (SSID)", &validate_ssid)
}

fn prompt_key(protocol: EncryptionProtocol, prompter: &mut dyn Prompter) -> Result<String> {
    prompter.text("Network key (password)", &|k: &str| validate_key(protocol, k))
}
