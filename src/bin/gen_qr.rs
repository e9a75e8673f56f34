//! Generates a QR code PNG that opens the LIFF app for one container.

use anyhow::{Context, Result, bail};
use clap::Parser;
use container_lending::domain::ContainerId;
use container_lending::qr::issue_container_qr;
use dotenvy::dotenv;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Parser, Debug)]
#[clap(name = "gen-qr")]
#[clap(about = "Generate a LIFF deep-link QR code for a lending container")]
struct Args {
    /// LIFF application ID (can also be set via LIFF_ID env var or .env)
    #[clap(long, env = "LIFF_ID")]
    liff_id: Option<String>,

    /// Container ID to encode (prompted for when omitted)
    #[clap(long)]
    container_id: Option<String>,

    /// Directory the <containerId>.png file is written to
    #[clap(long, default_value = ".")]
    output_dir: PathBuf,

    /// Do not open the generated image with the default viewer
    #[clap(long)]
    no_open: bool,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gen_qr=info,container_lending=info".into()),
        )
        .init();

    let liff_id = match non_blank(args.liff_id) {
        Some(id) => id,
        None => prompt("Enter the LIFF ID: ")?,
    };
    if liff_id.is_empty() {
        bail!("LIFF_ID not found, check your .env file");
    }

    let container_id = match non_blank(args.container_id) {
        Some(id) => id,
        None => prompt("Enter the target container ID: ")?,
    };
    let container_id = ContainerId::new(container_id);

    let issued = issue_container_qr(&liff_id, &container_id, &args.output_dir)
        .with_context(|| format!("Failed to generate QR code for container {}", container_id))?;

    println!("QR code target URL: {}", issued.url);
    println!("QR code saved as {}", issued.path.display());

    if !args.no_open {
        open_with_default_viewer(&issued.path);
    }

    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 標準入力から1行読み取る
fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;

    Ok(line.trim().to_string())
}

/// OS既定のビューアで開く（失敗しても警告のみ）
fn open_with_default_viewer(path: &Path) {
    match viewer_command(path).status() {
        Ok(status) if status.success() => {}
        Ok(status) => tracing::warn!(%status, "Image viewer exited with an error"),
        Err(e) => tracing::warn!(error = %e, "Could not open the image viewer"),
    }
}

#[cfg(target_os = "macos")]
fn viewer_command(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg(path);
    command
}

#[cfg(target_os = "windows")]
fn viewer_command(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(path);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn viewer_command(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}
