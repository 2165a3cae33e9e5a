//! Wires up a single chain's subscribers, workers and HTTP status surface,
//! and tears them all down on a process signal.

use std::net::SocketAddr;
use std::time::Duration;

use chainwatch_core::{ChainName, TxSubscriptionStrategy};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bootstrap::bootstrap;
use crate::error::EngineError;
use crate::http;
use crate::subscriber::Subscriber;
use crate::subscribers::{run_finalized_worker, run_pending_worker, BlockSubscriber, EventSubscriber, TransactionSubscriber};

/// How long the outer shutdown waits for subscribers to notice cancellation
/// and return before giving up on a clean join.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Bootstrap `chain_name`, launch every subscriber and worker it needs, and
/// block until a process signal requests shutdown.
pub async fn run(chain_name: ChainName, bus_url: &str, http_addr: SocketAddr) -> Result<(), EngineError> {
    let bootstrapped = bootstrap(chain_name, bus_url).await?;
    let cancel = CancellationToken::new();
    let receipt_fetcher = chainwatch_rpcs::ReceiptFetcher::for_chain(chain_name, bootstrapped.config.node);
    let strategy = bootstrapped.config.tx_subscription_strategy();
    let mut tasks = JoinSet::new();

    let block_subscriber = BlockSubscriber::new(
        bootstrapped.config.websocket_uri.clone(),
        bootstrapped.http_client.clone(),
        bootstrapped.config.http_uri.clone(),
        receipt_fetcher,
        bootstrapped.state.clone(),
        bootstrapped.bus.clone(),
    );
    spawn_subscriber(&mut tasks, block_subscriber, cancel.clone());

    let event_subscriber = EventSubscriber::new(
        bootstrapped.config.websocket_uri.clone(),
        bootstrapped.state.clone(),
        bootstrapped.bus.clone(),
    );
    spawn_subscriber(&mut tasks, event_subscriber, cancel.clone());

    if strategy != TxSubscriptionStrategy::Unsupported {
        let source_uri = match strategy {
            TxSubscriptionStrategy::ArbitrumSequencer => bootstrapped
                .config
                .sequencer_uri
                .clone()
                .unwrap_or_else(|| bootstrapped.config.websocket_uri.clone()),
            _ => bootstrapped.config.websocket_uri.clone(),
        };
        let transaction_subscriber = TransactionSubscriber::new(strategy, source_uri, bootstrapped.state.clone());
        spawn_subscriber(&mut tasks, transaction_subscriber, cancel.clone());

        tasks.spawn(run_pending_worker(
            bootstrapped.state.clone(),
            bootstrapped.bus.clone(),
            bootstrapped.queues.pending,
            cancel.clone(),
        ));
    }

    tasks.spawn(run_finalized_worker(
        bootstrapped.bus.clone(),
        bootstrapped.queues.finalized,
        cancel.clone(),
    ));

    let http_task = tokio::spawn(http::serve(http_addr, bootstrapped.state.clone(), cancel.clone()));

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, cancelling subscribers");
    bootstrapped.state.set_live(false);
    cancel.cancel();

    let join_all = async {
        while tasks.join_next().await.is_some() {}
    };
    if tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, join_all).await.is_err() {
        warn!("subscribers did not finish within the shutdown grace period, forcing exit");
    }

    match http_task.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "http status surface exited with an error"),
        Err(err) => warn!(error = %err, "http status surface task panicked"),
    }

    Ok(())
}

fn spawn_subscriber<S: Subscriber + Send + Sync + 'static>(tasks: &mut JoinSet<()>, subscriber: S, cancel: CancellationToken) {
    tasks.spawn(async move { subscriber.run(cancel).await });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
}
