//! Ctrl-C handling.
//!
//! An interrupt is a normal way to stop a long history walk, so the process
//! says goodbye and exits with status 0. A claimed temporary artifact stays
//! on disk and has to be removed before the next run.

use anyhow::Result;

pub const FAREWELL: &str = "Process interrupted. Goodbye.";

/// Watch for SIGINT on a background thread.
///
/// On Unix the handler is registered before this returns, so an interrupt
/// that arrives while the watcher thread is still starting is not lost.
pub fn install() -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    #[cfg(unix)]
    let mut sigint = {
        let _guard = rt.enter();
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?
    };

    std::thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            #[cfg(unix)]
            let interrupted = rt.block_on(sigint.recv()).is_some();
            #[cfg(not(unix))]
            let interrupted = rt.block_on(tokio::signal::ctrl_c()).is_ok();

            if interrupted {
                eprintln!("\n{FAREWELL}\n");
                std::process::exit(0);
            }
        })?;

    Ok(())
}
