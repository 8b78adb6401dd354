//! Signal adapter
//!
//! Translates process signals into a single awaitable event. Teardown
//! itself lives in [`crate::server::StaticAssetServer::stop`]; callers
//! select on this future and invoke `stop` themselves, so no teardown
//! logic is embedded in a signal handler.

/// Resolve when an interrupt or termination signal arrives
pub async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = sigterm.recv() => {}
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
