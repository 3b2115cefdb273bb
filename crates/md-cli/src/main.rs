//! MirrorDesk CLI
//!
//! Pairs with a MirrorDesk PC agent on the local network and drives it:
//! - Pairing (host + code, or the text of the PC's QR code)
//! - Screen watching and screenshots
//! - Remote input (clicks, shortcuts, system commands, apps)
//! - PC metrics

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use md_core::config::ClientConfig;
use md_core::PairingTarget;
use md_protocol::{MouseButton, NormalizedPoint, RemoteCommand};
use mirrordesk::commands;

#[derive(Parser)]
#[command(name = "mirrordesk")]
#[command(author, version, about = "Remote desktop client for MirrorDesk PC agents")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where to pair
#[derive(Args)]
struct TargetArgs {
    /// Agent host or URL with --code, otherwise the PC's QR text
    /// Examples: "192.168.1.20", "192.168.1.20:123456"
    /// If omitted, the configured default_host is used
    target: Option<String>,
    /// 6-digit connection code shown on the PC
    #[arg(long)]
    code: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that an agent is running
    Probe {
        /// Agent host or URL (defaults to the configured default_host)
        host: Option<String>,
    },

    /// Pair with an agent and report the result
    Pair {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Pair and stream the screen, one line per frame
    Watch {
        #[command(flatten)]
        target: TargetArgs,
        /// Delay between frame fetches (overrides config)
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Stop after this many frames
        #[arg(short = 'n', long)]
        frames: Option<u64>,
    },

    /// Pair and save one screen frame
    Screenshot {
        #[command(flatten)]
        target: TargetArgs,
        /// File to write the image to
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Send an arbitrary command
    Exec {
        /// Agent host or URL with --code, otherwise the PC's QR text
        target: String,
        /// Command type, e.g. mouse_click
        kind: String,
        /// Command data as key=value pairs
        data: Vec<String>,
        /// 6-digit connection code shown on the PC
        #[arg(long)]
        code: Option<String>,
    },

    /// Click a mouse button
    Click {
        #[command(flatten)]
        target: TargetArgs,
        /// left, right or middle
        #[arg(short, long, default_value = "left")]
        button: MouseButton,
        /// Double-click instead
        #[arg(long)]
        double: bool,
        /// Horizontal position in [0, 1], moves the cursor first
        #[arg(long, requires = "y")]
        x: Option<f32>,
        /// Vertical position in [0, 1], moves the cursor first
        #[arg(long, requires = "x")]
        y: Option<f32>,
    },

    /// Press a key combination such as ctrl+c
    Shortcut {
        /// Agent host or URL with --code, otherwise the PC's QR text
        target: String,
        shortcut: String,
        /// 6-digit connection code shown on the PC
        #[arg(long)]
        code: Option<String>,
    },

    /// Run a system command such as lock
    System {
        /// Agent host or URL with --code, otherwise the PC's QR text
        target: String,
        command: String,
        /// 6-digit connection code shown on the PC
        #[arg(long)]
        code: Option<String>,
    },

    /// Open an application on the PC
    Open {
        /// Agent host or URL with --code, otherwise the PC's QR text
        target: String,
        app: String,
        /// 6-digit connection code shown on the PC
        #[arg(long)]
        code: Option<String>,
    },

    /// Show CPU, RAM and network usage of the PC
    Metrics {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Decode the text of a pairing QR code
    Qr {
        /// Scanned text, e.g. "192.168.1.20:8000:123456"
        text: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = commands::load_client_config(cli.config.as_ref());

    match cli.command {
        Commands::Probe { host } => {
            let host = host
                .or_else(|| config.default_host.clone())
                .context("No host given and no default_host configured")?;
            commands::probe_command(&config, &host).await?;
        }

        Commands::Pair { target } => {
            let target = resolve(&config, &target)?;
            commands::pair_command(&config, &target).await?;
        }

        Commands::Watch {
            target,
            interval_ms,
            frames,
        } => {
            if let Some(ms) = interval_ms {
                config.stream.interval = Duration::from_millis(ms.max(1));
            }
            let target = resolve(&config, &target)?;
            commands::watch_command(&config, &target, frames).await?;
        }

        Commands::Screenshot { target, out } => {
            let target = resolve(&config, &target)?;
            commands::screenshot_command(&config, &target, &out).await?;
        }

        Commands::Exec {
            target,
            kind,
            data,
            code,
        } => {
            let target = commands::resolve_target(&config, Some(&target), code.as_deref())?;
            commands::exec_command(&config, &target, &kind, &data).await?;
        }

        Commands::Click {
            target,
            button,
            double,
            x,
            y,
        } => {
            let at = match (x, y) {
                (Some(x), Some(y)) => Some(NormalizedPoint::new(x, y)?),
                _ => None,
            };
            let command = if double {
                RemoteCommand::MouseDoubleClick { at }
            } else {
                RemoteCommand::MouseClick { button, at }
            };
            let target = resolve(&config, &target)?;
            commands::send_command(&config, &target, command).await?;
        }

        Commands::Shortcut {
            target,
            shortcut,
            code,
        } => {
            let target = commands::resolve_target(&config, Some(&target), code.as_deref())?;
            let command = RemoteCommand::KeyboardShortcut(shortcut);
            commands::send_command(&config, &target, command).await?;
        }

        Commands::System {
            target,
            command,
            code,
        } => {
            let target = commands::resolve_target(&config, Some(&target), code.as_deref())?;
            let command = RemoteCommand::SystemCommand(command);
            commands::send_command(&config, &target, command).await?;
        }

        Commands::Open { target, app, code } => {
            let target = commands::resolve_target(&config, Some(&target), code.as_deref())?;
            commands::send_command(&config, &target, RemoteCommand::OpenApp(app)).await?;
        }

        Commands::Metrics { target } => {
            let target = resolve(&config, &target)?;
            commands::metrics_command(&config, &target).await?;
        }

        Commands::Qr { text } => {
            commands::qr_command(&config, &text)?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                commands::config_show(cli.config.as_ref())?;
            }
            ConfigAction::Init { force } => {
                commands::config_init(cli.config.as_ref(), force)?;
            }
            ConfigAction::Path => {
                commands::config_path(cli.config.as_ref())?;
            }
        },
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn resolve(config: &ClientConfig, args: &TargetArgs) -> Result<PairingTarget> {
    commands::resolve_target(config, args.target.as_deref(), args.code.as_deref())
}
