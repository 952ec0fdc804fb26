use std::time::Duration;

use enforcer_client::RemoteDirectory;
use enforcer_engine::Enforcer;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::error::DaemonError;

/// Build a tokio runtime and run the enforcement loop until ctrl-c.
pub fn start_blocking<D>(enforcer: Enforcer<D>, interval: Duration) -> Result<(), DaemonError>
where
    D: RemoteDirectory + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(DaemonError::Runtime)?;

    runtime.block_on(async move {
        let (shutdown_tx, _) = broadcast::channel::<()>(4);

        let loop_handle = {
            let shutdown = shutdown_tx.clone();
            let shutdown_rx = shutdown.subscribe();
            tokio::spawn(async move {
                let result = run(enforcer, interval, shutdown_rx).await.map(|_| ());
                let _ = shutdown.send(());
                result
            })
        };

        let signal_handle = {
            let shutdown = shutdown_tx.clone();
            let mut shutdown_rx = shutdown.subscribe();
            tokio::spawn(async move {
                tokio::select! {
                    _ = shutdown_rx.recv() => Ok(()),
                    signal = tokio::signal::ctrl_c() => {
                        match signal {
                            Ok(()) => {
                                tracing::info!("received ctrl-c, shutting down");
                                let _ = shutdown.send(());
                                Ok(())
                            }
                            Err(err) => Err(DaemonError::Signal(err)),
                        }
                    }
                }
            })
        };

        let (loop_result, signal_result) = tokio::join!(loop_handle, signal_handle);
        handle_join("enforcement_loop", loop_result)?;
        handle_join("signal_handler", signal_result)?;
        Ok(())
    })
}

/// Run one enforcement cycle per `period` until `shutdown_rx` fires.
///
/// The first tick fires immediately. A cycle in progress always completes;
/// shutdown is observed between cycles. Returns the enforcer so callers can
/// inspect its final state.
pub async fn run<D>(
    mut enforcer: Enforcer<D>,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<Enforcer<D>, DaemonError>
where
    D: RemoteDirectory + Send + 'static,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(
        owner = enforcer.owner(),
        interval_ms = period.as_millis() as u64,
        policies = %enforcer.policies().dir().display(),
        "enforcer started",
    );

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                let (returned, report) = tokio::task::spawn_blocking(move || {
                    let report = enforcer.run_cycle();
                    (enforcer, report)
                })
                .await
                .map_err(|err| DaemonError::Join {
                    task: "enforcement_cycle",
                    message: err.to_string(),
                })?;
                enforcer = returned;
                if report.changed {
                    tracing::debug!(
                        repositories = report.repositories.len(),
                        failed = report.failed(),
                        "cycle finished",
                    );
                }
            }
        }
    }

    tracing::info!("enforcer stopped");
    Ok(enforcer)
}

fn handle_join(
    task: &'static str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Join {
            task,
            message: err.to_string(),
        }),
    }
}
