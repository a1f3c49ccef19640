// src/qr.rs - Wi-Fi 配置串生成，用 qrcode crate 编码并渲染二维码

use crate::error::{EncodeError, ParseError, WriteError};
use crate::types::Configuration;
use image::{imageops, ImageBuffer, ImageFormat, Luma};
use qrcode::render::unicode;
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// qrcode 渲染器四周留白（静区）的模块数
const QUIET_ZONE: u32 = 4;

/// WIFI: 格式中需要转义的保留字符
const RESERVED: [char; 5] = ['\\', ';', ',', '"', ':'];

// ── Schema ──────────────────────────────────────────────────

/// 用反斜杠转义 Wi-Fi 二维码字段中的保留字符
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for c in s.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// WIFI:S:My_SSID;T:WPA;P:key goes here;H:false;
//      |         |     |               |
//      |         |     |               +-- 是否隐藏 SSID (true/false)
//      |         |     +-- 预共享密钥
//      |         +-- 加密类型
//      +-- SSID
pub fn build_schema(config: &Configuration) -> String {
    format!(
        "WIFI:S:{};T:{};P:{};H:{};",
        escape(&config.ssid),
        config.protocol.code(),
        escape(&config.key),
        config.hidden,
    )
}

// ── Encoding ────────────────────────────────────────────────

/// 纠错等级：越高越耐污损，但码图越大
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ErrorCorrection {
    Low,
    Medium,
    Quartile,
    #[default]
    High,
}

impl ErrorCorrection {
    fn letter(self) -> &'static str {
        match self {
            ErrorCorrection::Low => "L",
            ErrorCorrection::Medium => "M",
            ErrorCorrection::Quartile => "Q",
            ErrorCorrection::High => "H",
        }
    }
}

impl From<ErrorCorrection> for EcLevel {
    fn from(ec: ErrorCorrection) -> Self {
        match ec {
            ErrorCorrection::Low => EcLevel::L,
            ErrorCorrection::Medium => EcLevel::M,
            ErrorCorrection::Quartile => EcLevel::Q,
            ErrorCorrection::High => EcLevel::H,
        }
    }
}

impl fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl FromStr for ErrorCorrection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(ErrorCorrection::Low),
            "m" | "medium" => Ok(ErrorCorrection::Medium),
            "q" | "quartile" => Ok(ErrorCorrection::Quartile),
            "h" | "high" => Ok(ErrorCorrection::High),
            _ => Err(ParseError::UnknownErrorCorrection(s.to_string())),
        }
    }
}

impl TryFrom<String> for ErrorCorrection {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ErrorCorrection> for String {
    fn from(ec: ErrorCorrection) -> Self {
        ec.letter().to_string()
    }
}

/// 把网络配置编码成二维码
pub fn encode(config: &Configuration, ec: ErrorCorrection) -> Result<QrCode, EncodeError> {
    let schema = build_schema(config);
    debug!(bytes = schema.len(), level = %ec, "encoding wifi schema");
    QrCode::with_error_correction_level(schema.as_bytes(), ec.into()).map_err(|e| match e {
        QrError::DataTooLong => EncodeError::TooLong(schema.len()),
        other => EncodeError::Other(other),
    })
}

// ── Rendering ───────────────────────────────────────────────

/// 终端紧凑输出，一个字符格显示上下两个模块
pub fn render_text(code: &QrCode) -> String {
    // 深色终端背景下需反色：浅色模块与静区画成 █，扫码器才能识别
    code.render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build()
}

/// 生成边长恰为 `size` 像素的灰度图
///
/// 每个模块占整数个像素，码图居中放在白色画布上；
/// `size` 不足每模块 1 像素时按最小尺寸输出
pub fn render_png(code: &QrCode, size: u32) -> ImageBuffer<Luma<u8>, Vec<u8>> {
    let modules = code.width() as u32 + 2 * QUIET_ZONE;
    let px = (size / modules).max(1);
    let symbol = code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(px, px)
        .build();

    let side = size.max(symbol.width());
    if side == symbol.width() {
        return symbol;
    }
    let mut canvas = ImageBuffer::from_pixel(side, side, Luma([255u8]));
    let offset = i64::from((side - symbol.width()) / 2);
    imageops::overlay(&mut canvas, &symbol, offset, offset);
    canvas
}

/// 渲染为 PNG 字节（内存中完成，不触碰文件系统）
pub fn encode_png(code: &QrCode, size: u32) -> Result<Vec<u8>, image::ImageError> {
    let image = render_png(code, size);
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// 写出 PNG 文件：先在内存中编码，成功后一次性写盘，失败时不留半截文件
pub fn write_png(code: &QrCode, size: u32, path: &Path) -> Result<(), WriteError> {
    let bytes = encode_png(code, size).map_err(|source| WriteError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, &bytes).map_err(|source| WriteError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "png written");
    Ok(())
}

/// 文件名不以 `.png` 结尾时补上后缀
pub fn normalize_output_path(path: &Path) -> PathBuf {
    // 按文件名后缀判断：`.png` 这类点开头的文件名 extension() 为 None
    if path
        .file_name()
        .is_some_and(|name| name.as_encoded_bytes().ends_with(b".png"))
    {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".png");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EncryptionProtocol;

    fn cfg(ssid: &str, key: &str, protocol: EncryptionProtocol, hidden: bool) -> Configuration {
        Configuration::new(ssid, key, protocol, hidden)
    }

    #[test]
    fn escape_leaves_plain_text_alone() {
        assert_eq!(escape("plain ssid-01_ü"), "plain ssid-01_ü");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn escape_each_reserved_character() {
        for c in RESERVED {
            assert_eq!(escape(&format!("a{c}b")), format!("a\\{c}b"));
        }
    }

    #[test]
    fn escape_all_reserved_characters_together() {
        assert_eq!(escape(r#"abc\;,":xyz"#), r#"abc\\\;\,\"\:xyz"#);
    }

    #[test]
    fn escape_is_not_idempotent() {
        let once = escape(r"a\b");
        assert_eq!(once, r"a\\b");
        assert_eq!(escape(&once), r"a\\\\b");
    }

    #[test]
    fn schema_for_each_protocol() {
        let cases = [
            (EncryptionProtocol::Wpa2, "WIFI:S:ssid1;T:WPA2;P:key1;H:false;"),
            (EncryptionProtocol::Wpa, "WIFI:S:ssid1;T:WPA;P:key1;H:false;"),
            (EncryptionProtocol::Wep, "WIFI:S:ssid1;T:WEP;P:key1;H:false;"),
        ];
        for (protocol, want) in cases {
            assert_eq!(build_schema(&cfg("ssid1", "key1", protocol, false)), want);
        }
    }

    #[test]
    fn schema_for_open_network_keeps_key_field() {
        assert_eq!(
            build_schema(&cfg("ssid1", "", EncryptionProtocol::None, false)),
            "WIFI:S:ssid1;T:nopass;P:;H:false;"
        );
        assert_eq!(
            build_schema(&cfg("ssid1", "leftover", EncryptionProtocol::None, false)),
            "WIFI:S:ssid1;T:nopass;P:leftover;H:false;"
        );
    }

    #[test]
    fn schema_hidden_flag() {
        assert_eq!(
            build_schema(&cfg("ssid1", "key1", EncryptionProtocol::Wpa2, true)),
            "WIFI:S:ssid1;T:WPA2;P:key1;H:true;"
        );
    }

    #[test]
    fn schema_empty_ssid_is_not_omitted() {
        assert_eq!(
            build_schema(&cfg("", "", EncryptionProtocol::Wpa, false)),
            "WIFI:S:;T:WPA;P:;H:false;"
        );
    }

    #[test]
    fn schema_escapes_ssid_and_key() {
        assert_eq!(
            build_schema(&cfg(r#"abc\;,":xyz"#, r#"xyz\;,":abc"#, EncryptionProtocol::Wpa2, false)),
            r#"WIFI:S:abc\\\;\,\"\:xyz;T:WPA2;P:xyz\\\;\,\"\:abc;H:false;"#
        );
    }

    #[test]
    fn error_correction_parsing() {
        assert_eq!("h".parse::<ErrorCorrection>(), Ok(ErrorCorrection::High));
        assert_eq!("Medium".parse::<ErrorCorrection>(), Ok(ErrorCorrection::Medium));
        assert_eq!("Q".parse::<ErrorCorrection>(), Ok(ErrorCorrection::Quartile));
        assert!(matches!(
            "x".parse::<ErrorCorrection>(),
            Err(ParseError::UnknownErrorCorrection(_))
        ));
        assert_eq!(ErrorCorrection::default(), ErrorCorrection::High);
    }

    #[test]
    fn encode_small_payload() {
        let code = encode(
            &cfg("ssid1", "1234", EncryptionProtocol::Wpa2, false),
            ErrorCorrection::High,
        )
        .unwrap();
        assert_eq!(code.error_correction_level(), EcLevel::H);
        assert!(code.width() >= 21);
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let ssid = "a".repeat(7100);
        let err = encode(
            &cfg(&ssid, "test", EncryptionProtocol::Wpa2, false),
            ErrorCorrection::High,
        )
        .err()
        .expect("oversized payload must not encode");
        assert!(matches!(err, EncodeError::TooLong(n) if n > 7100));
    }

    #[test]
    fn text_rendering_is_square_ish() {
        let code = encode(
            &cfg("ssid1", "key1", EncryptionProtocol::Wpa2, false),
            ErrorCorrection::High,
        )
        .unwrap();
        let text = render_text(&code);
        let modules = code.width() + 2 * QUIET_ZONE as usize;
        let lines: Vec<&str> = text.lines().collect();
        // 两行模块共用一行文本
        assert!(lines.len() >= modules / 2 && lines.len() < modules);
        assert!(lines.iter().all(|l| l.chars().count() == modules));
    }

    #[test]
    fn text_rendering_draws_quiet_zone_as_blocks() {
        let code = encode(
            &cfg("ssid1", "1234", EncryptionProtocol::Wpa2, false),
            ErrorCorrection::High,
        )
        .unwrap();
        let text = render_text(&code);
        let first = text.lines().next().unwrap();
        assert!(!first.is_empty());
        assert!(first.chars().all(|c| c == '█'), "first line: {first:?}");
        // 第三行进入定位图案，深色模块不再是 █
        let finder_row = text.lines().nth(2).unwrap();
        assert!(finder_row.starts_with("████"));
        assert!(finder_row.chars().any(|c| c != '█'));
    }

    #[test]
    fn png_has_requested_side() {
        let code = encode(
            &cfg("ssid1", "key1", EncryptionProtocol::Wpa2, false),
            ErrorCorrection::High,
        )
        .unwrap();
        for size in [256, 512, 300] {
            let img = render_png(&code, size);
            assert_eq!((img.width(), img.height()), (size, size));
            // 静区角落保持白色
            assert_eq!(img.get_pixel(0, 0), &Luma([255u8]));
        }
    }

    #[test]
    fn png_grows_to_minimum_symbol_size() {
        let code = encode(
            &cfg("ssid1", "key1", EncryptionProtocol::Wpa2, false),
            ErrorCorrection::High,
        )
        .unwrap();
        let min = code.width() as u32 + 2 * QUIET_ZONE;
        let img = render_png(&code, 10);
        assert_eq!((img.width(), img.height()), (min, min));
    }

    #[test]
    fn write_png_creates_decodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = normalize_output_path(&dir.path().join("office"));
        let code = encode(
            &cfg("office", "s3cret", EncryptionProtocol::Wpa, false),
            ErrorCorrection::Medium,
        )
        .unwrap();
        write_png(&code, 256, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (256, 256));
    }

    #[test]
    fn write_png_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("qr.png");
        let code = encode(
            &cfg("x", "y", EncryptionProtocol::Wpa2, false),
            ErrorCorrection::High,
        )
        .unwrap();
        assert!(matches!(
            write_png(&code, 64, &path),
            Err(WriteError::Write { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn encode_png_produces_image_in_memory() {
        let code = encode(
            &cfg("x", "y", EncryptionProtocol::Wpa2, false),
            ErrorCorrection::High,
        )
        .unwrap();
        let bytes = encode_png(&code, 128).unwrap();
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (128, 128));
    }

    #[test]
    fn output_path_gets_png_extension() {
        assert_eq!(
            normalize_output_path(Path::new("imagefilename")),
            PathBuf::from("imagefilename.png")
        );
        assert_eq!(
            normalize_output_path(Path::new("imagefilename.png")),
            PathBuf::from("imagefilename.png")
        );
        assert_eq!(
            normalize_output_path(Path::new("out/qr.jpg")),
            PathBuf::from("out/qr.jpg.png")
        );
        // 点开头的文件名
        assert_eq!(normalize_output_path(Path::new(".png")), PathBuf::from(".png"));
        assert_eq!(
            normalize_output_path(Path::new("dir/.png")),
            PathBuf::from("dir/.png")
        );
        assert_eq!(normalize_output_path(Path::new("png")), PathBuf::from("png.png"));
    }
}
