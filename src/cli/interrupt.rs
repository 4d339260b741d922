//! Ctrl-C handling
//!
//! The shell blocks on terminal input, so the interrupt is watched from a
//! background thread. Every mutation is already saved, so exiting right away
//! loses nothing.

use std::io::{self, Write};
use std::thread;

use anyhow::{Context, Result};
use tracing::info;

/// Installs a watcher that prints a shutdown message and exits with status 0
pub fn install() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?;

    thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Received interrupt, shutting down");
                    let mut stdout = io::stdout();
                    let _ = writeln!(stdout, "\n\nInterrupted. Exiting...");
                    let _ = stdout.flush();
                    std::process::exit(0);
                }
            });
        })
        .context("Failed to spawn interrupt watcher")?;

    Ok(())
}
