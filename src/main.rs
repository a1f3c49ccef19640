// src/main.rs - 主入口：参数、配置、交互输入、输出
mod config;
mod error;
mod prompt;
mod qr;
mod types;

use anyhow::Result;
use clap::Parser;
use config::Settings;
use prompt::{Requested, TerminalPrompter};
use qr::ErrorCorrection;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

// ════════════════════════════════════════════════════════════════
// CLI 参数
// ════════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(
    name = "wifiqr",
    about = "Wi-Fi network QR code generator",
    long_about = "Encodes Wi-Fi credentials into a QR code that phone cameras can join from. \
                  Missing or invalid SSID, key or protocol values are asked for interactively.",
    version
)]
struct Cli {
    /// Name of the wireless network; prompted for if not set
    #[arg(short = 'i', long)]
    ssid: Option<String>,

    /// Pre-shared key (PSK); prompted for if not set and the network is protected
    #[arg(short, long)]
    key: Option<String>,

    /// Encryption protocol: WPA2, WPA, WEP or NONE [default: WPA2]
    #[arg(short, long)]
    protocol: Option<String>,

    /// Mark the SSID as hidden
    #[arg(long)]
    hidden: bool,

    /// PNG file to write; prints to stdout if not set
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Image width and height in pixels [default: 256]
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    size: Option<u32>,

    /// Error correction level: L, M, Q or H [default: H]
    #[arg(short, long, value_name = "LEVEL")]
    error_correction: Option<ErrorCorrection>,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn requested(&self) -> Requested {
        Requested {
            ssid: self.ssid.clone(),
            key: self.key.clone(),
            protocol: self.protocol.clone(),
            hidden: self.hidden,
        }
    }
}

// ════════════════════════════════════════════════════════════════
// 入口
// ════════════════════════════════════════════════════════════════

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_exit_status(&e));
        }
    };
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// clap 解析失败时的退出码：--help / --version 为 0，用法错误统一为 1（clap 默认是 2）
fn parse_exit_status(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::load()?;
    let size = cli.size.unwrap_or(settings.size);
    let ec = cli.error_correction.unwrap_or(settings.error_correction);

    let config = prompt::resolve(
        cli.requested(),
        settings.protocol,
        &mut TerminalPrompter::default(),
    )?;
    info!(ssid = %config.ssid, protocol = %config.protocol, hidden = config.hidden, "network resolved");

    let code = qr::encode(&config, ec)?;

    match &cli.output {
        None => println!("{}", qr::render_text(&code)),
        Some(path) => {
            let path = qr::normalize_output_path(path);
            qr::write_png(&code, size, &path)?;
            println!("QR code was successfully saved to {}.", path.display());
        }
    }
    Ok(())
}
