//! Sentinel host binary.
//!
//! `run` drives the bridge against the simulated platform from stdin.
//! `encode` and `validate` expose the codec and number validation as
//! one-shot tools.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use sentinel::bridge::{self, BridgeDeps, BridgeHandle};
use sentinel::call;
use sentinel::codec::{self, RawFrame};
use sentinel::config::SentinelConfig;
use sentinel::logging;
use sentinel::permission::Capability;
use sentinel::platform::sim::{ConsoleSurface, LogDialer, SimCamera, SimPrompter};
use sentinel::platform::PermissionPrompter;

#[derive(Parser)]
#[command(
    name = "sentinel",
    version,
    about = "Camera and emergency-call bridge for an embedded web UI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge against the simulated platform, reading commands from stdin.
    Run,

    /// Encode a raw frame file into a JPEG data URL.
    Encode {
        /// Frame file: planar I420 (Y, U, V) or JPEG bytes.
        path: PathBuf,

        /// Layout of the input file.
        #[arg(long, value_enum, default_value = "yuv")]
        format: InputFormat,

        /// Frame width in pixels.
        #[arg(long)]
        width: u32,

        /// Frame height in pixels.
        #[arg(long)]
        height: u32,
    },

    /// Check whether a phone number would be accepted for dialing.
    Validate {
        /// Candidate number.
        number: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Planar YUV 4:2:0.
    Yuv,
    /// Already-compressed JPEG.
    Jpeg,
}

/// What the stdin loop does after a line.
enum LineAction {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let config = SentinelConfig::load().context("failed to load configuration")?;

    match cli.command {
        Commands::Run => run(config).await,
        Commands::Encode {
            path,
            format,
            width,
            height,
        } => {
            logging::init_cli(&config.bridge.log_level);
            encode_file(&path, format, width, height)
        }
        Commands::Validate { number } => {
            logging::init_cli(&config.bridge.log_level);
            Ok(validate_number(&number))
        }
    }
}

async fn run(config: SentinelConfig) -> Result<ExitCode> {
    let logs_dir = config.logs_dir()?;
    let _guard = logging::init_production(&logs_dir, &config.bridge.log_level)?;

    let (prompter, mut prompts) = SimPrompter::new(&config.simulation);
    let prompter = Arc::new(prompter);
    let deps = BridgeDeps {
        hardware: Arc::new(SimCamera::new(&config.simulation)),
        prompter: Arc::clone(&prompter) as Arc<dyn PermissionPrompter>,
        dialer: Arc::new(LogDialer),
        surface: Box::new(ConsoleSurface),
    };
    let (handle, join) =
        bridge::spawn(deps, config.bridge_options()).context("failed to start bridge")?;

    info!(
        interface = %config.bridge.interface_name,
        page = %config.bridge.page_url,
        logs = %logs_dir.display(),
        "ui page loaded"
    );
    handle.start().context("failed to start camera")?;
    print_help(&handle);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    debug!("stdin closed");
                    break;
                };
                if matches!(handle_line(&handle, &prompter, &line), LineAction::Quit) {
                    break;
                }
            }
            Some(capability) = prompts.recv() => {
                println!(
                    "[prompt] {capability} permission requested; answer with `grant {capability}` or `deny {capability}`"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received shutdown signal");
                break;
            }
        }
    }

    if let Err(e) = handle.shutdown().await {
        debug!(error = %e, "bridge already stopped");
    }
    join.await.context("bridge task failed")?;
    Ok(ExitCode::SUCCESS)
}

fn handle_line(handle: &BridgeHandle, prompter: &SimPrompter, line: &str) -> LineAction {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return LineAction::Continue;
    };
    let rest: Vec<&str> = words.collect();

    let result = match word {
        "quit" | "exit" => return LineAction::Quit,
        "help" => {
            print_help(handle);
            return LineAction::Continue;
        }
        "start" => handle.start(),
        "stop" => handle.stop(),
        "capture" => handle.request_photo_capture(),
        "call" => {
            let number = rest.join(" ");
            handle.initiate_emergency_call((!number.is_empty()).then_some(number.as_str()))
        }
        "grant" | "deny" => {
            let granted = word == "grant";
            let Some(capability) = rest.first().and_then(|name| Capability::from_name(name))
            else {
                println!("[error] usage: {word} camera|telephony");
                return LineAction::Continue;
            };
            prompter.set_granted(capability, granted);
            handle.permission_result(capability, granted)
        }
        name => {
            let args: Vec<Value> = match rest.join(" ") {
                joined if joined.is_empty() => Vec::new(),
                joined => vec![Value::String(joined)],
            };
            handle.invoke(name, &args)
        }
    };

    if let Err(e) = result {
        warn!(input = line, error = %e, "command not accepted");
        println!("[error] {e}");
    }
    LineAction::Continue
}

fn print_help(handle: &BridgeHandle) {
    println!("ui commands: {}", handle.command_names().join(", "));
    println!("shortcuts:   capture | call <number> | grant|deny camera|telephony | start | stop | quit");
}

fn encode_file(path: &Path, format: InputFormat, width: u32, height: u32) -> Result<ExitCode> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let frame = match format {
        InputFormat::Yuv => split_i420(bytes, width, height)?,
        InputFormat::Jpeg => RawFrame::jpeg(width, height, bytes),
    };
    let jpeg = codec::encode(&frame)?;
    let data_url = codec::to_data_url(&jpeg)?;
    info!(
        input = %path.display(),
        jpeg_bytes = jpeg.len(),
        url_len = data_url.len(),
        "frame encoded"
    );
    println!("{data_url}");
    Ok(ExitCode::SUCCESS)
}

/// Split a planar I420 file into its three planes. Short files yield
/// truncated (possibly empty) planes, which the codec rejects or pads.
fn split_i420(mut bytes: Vec<u8>, width: u32, height: u32) -> Result<RawFrame> {
    let w = usize::try_from(width).context("width out of range")?;
    let h = usize::try_from(height).context("height out of range")?;
    let luma_len = w.saturating_mul(h);
    let chroma_len = w.div_ceil(2).saturating_mul(h.div_ceil(2));

    let v = bytes.split_off(luma_len.saturating_add(chroma_len).min(bytes.len()));
    let u = bytes.split_off(luma_len.min(bytes.len()));
    Ok(RawFrame::yuv420(width, height, bytes, u, v))
}

fn validate_number(number: &str) -> ExitCode {
    match call::validate(number) {
        Ok(valid) => {
            println!("valid: {valid}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("rejected: {e}");
            ExitCode::FAILURE
        }
    }
}
