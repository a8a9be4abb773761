//! The long-running `project` command.

use std::rc::Rc;
use std::time::Duration;

use pinpoint_common::{LayoutId, PinpointError};
use pinpoint_config::PinpointConfig;
use pinpoint_engine::Engine;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::renderer::LogRenderer;

/// How long to sleep when no write is pending.
const IDLE_TICK: Duration = Duration::from_secs(1);

pub fn project(
    config: &PinpointConfig,
    layout: &str,
    display: Option<usize>,
) -> Result<(), PinpointError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_projection(config, LayoutId::from(layout), display))
}

async fn run_projection(
    config: &PinpointConfig,
    layout: LayoutId,
    display: Option<usize>,
) -> Result<(), PinpointError> {
    let renderer = Rc::new(LogRenderer::new());
    let engine = Engine::open(config, renderer.clone())?;

    let report = engine.projection().project(&layout, display)?;
    for (instance, error) in &report.failed {
        warn!(%instance, "not shown: {error}");
    }
    info!(
        layout = %layout,
        display = report.display.index,
        widgets = renderer.mounted(),
        "projecting, press Ctrl-C to stop"
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        let wake = engine
            .next_deadline()
            .map(Instant::from_std)
            .unwrap_or_else(|| Instant::now() + IDLE_TICK);
        tokio::select! {
            signal = &mut ctrl_c => {
                if let Err(e) = signal {
                    warn!("failed to listen for Ctrl-C: {e}");
                }
                break;
            }
            _ = tokio::time::sleep_until(wake) => {
                let summary = engine.poll();
                if summary.written > 0 || summary.failed > 0 {
                    info!(written = summary.written, failed = summary.failed, "flushed");
                }
            }
        }
    }

    info!("shutting down");
    let summary = engine.shutdown();
    if summary.failed > 0 {
        return Err(PinpointError::Other(format!(
            "{} record(s) could not be written",
            summary.failed
        )));
    }
    Ok(())
}
