//! # 过敏原扫描客户端 — 终端入口
//!
//! 本文件仅负责命令行解析、配置加载与页面装配。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use allergen_scanner::barcode::KeyboardWedgeEngine;
use allergen_scanner::config::ClientConfig;
use allergen_scanner::error::AppError;
use allergen_scanner::media::{StillFrameCamera, UploadSelection};
use allergen_scanner::page::{ScanPage, TerminalView, Trigger};
use allergen_scanner::scan::{HttpScanClient, ScanDispatcher, SubmitOutcome};
use allergen_scanner::settings;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "allergen-scan")]
#[command(about = "Scan ingredient labels and barcodes for allergens")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (JSON, camelCase keys)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Scan service base URL, overrides the settings file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Print the result area as an HTML fragment
    #[arg(long, global = true)]
    html: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan an ingredient image (file path or data URL)
    Image {
        source: String,
    },

    /// Look up a barcode
    Barcode {
        code: String,
    },

    /// Capture a frame from a still image source and scan it
    Capture {
        /// Image used as the camera frame
        #[arg(short, long)]
        frame: PathBuf,
    },

    /// Read barcodes typed by a keyboard-wedge scanner on stdin
    Watch,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            log::error!("❌ {}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let config = load_config(&cli)?;
    let client = HttpScanClient::new(&config)?;
    log::info!(
        "🚀 扫描客户端已就绪 - image={} barcode={}",
        client.image_url(),
        client.barcode_url()
    );

    let confirm_capture = config.confirm_capture;
    let view = TerminalView::new(std::io::stdout(), cli.html);
    let engine = KeyboardWedgeEngine::new(tokio::io::stdin());
    let mut page = ScanPage::new(ScanDispatcher::new(client), engine, view, config);

    match cli.command {
        Commands::Image { source } => {
            page.handle_trigger(Trigger::ScanUpload(Some(UploadSelection::from_arg(&source))));
            page.settle().await;
            Ok(exit_code(page.last_outcome()))
        }
        Commands::Barcode { code } => {
            page.handle_trigger(Trigger::LookupBarcode(code));
            page.settle().await;
            Ok(exit_code(page.last_outcome()))
        }
        Commands::Capture { frame } => {
            page.mount(&mut StillFrameCamera::new(frame));
            page.handle_trigger(Trigger::Capture);
            if confirm_capture && page.state().last_capture.is_some() {
                page.handle_trigger(Trigger::ScanCaptured);
            }
            page.settle().await;
            Ok(exit_code(page.last_outcome()))
        }
        Commands::Watch => {
            eprintln!("Scan barcodes now (Ctrl-D to finish)");
            loop {
                page.handle_trigger(Trigger::StartBarcode);
                if !page.state().is_scanning() {
                    break;
                }
                page.settle().await;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// 单次扫描命令的退出码：只有拿到扫描结果才算成功。
fn exit_code(outcome: Option<&SubmitOutcome>) -> ExitCode {
    if scan_succeeded(outcome) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn scan_succeeded(outcome: Option<&SubmitOutcome>) -> bool {
    matches!(outcome, Some(SubmitOutcome::Results(_)))
}

fn load_config(cli: &Cli) -> Result<ClientConfig, AppError> {
    let mut config = match cli.config.as_deref() {
        Some(path) => settings::load_settings(path)?,
        None => ClientConfig::default(),
    };
    if let Some(base_url) = cli.base_url.as_ref() {
        config.base_url = base_url.clone();
        config.validate()?;
    }
    Ok(config)
}
