//! Server detail poller - keeps one server's metric series and service list current

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::interval;
use tracing::{debug, instrument, trace, warn};

use crate::client::MonitorClient;
use crate::series::project;

use super::messages::{PollerCommand, ServerSnapshot};

/// Actor that polls metrics and service status for a single server
///
/// Both fetches belong to one poll generation: if either fails, the whole
/// snapshot fails. Mixing a fresh metric series with a stale service list
/// would show two generations at once.
struct ServerPollerActor {
    client: MonitorClient,
    server_id: String,
    command_rx: mpsc::Receiver<PollerCommand>,
    snapshot_tx: watch::Sender<ServerSnapshot>,
    interval_duration: Duration,
    generation: u64,
}

impl ServerPollerActor {
    #[instrument(skip(self), fields(server = %self.server_id))]
    async fn run(mut self) {
        debug!("starting server poller");

        let mut ticker = interval(self.interval_duration);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // The fetch owns its client and target so the command
                    // channel stays pollable beside it; shutdown drops the
                    // in-flight response without applying it.
                    self.generation += 1;
                    let fetch = Self::poll(
                        self.client.clone(),
                        self.server_id.clone(),
                        self.generation,
                    );

                    tokio::select! {
                        biased;
                        cmd = self.command_rx.recv() => {
                            if !self.handle_command(cmd).await {
                                break;
                            }
                        }
                        snapshot = fetch => {
                            self.publish(snapshot);
                        }
                    }
                }

                cmd = self.command_rx.recv() => {
                    if !self.handle_command(cmd).await {
                        break;
                    }
                }
            }
        }

        debug!("server poller stopped");
    }

    async fn handle_command(&mut self, cmd: Option<PollerCommand>) -> bool {
        match cmd {
            Some(PollerCommand::PollNow { respond_to }) => {
                debug!("received PollNow command");
                self.generation += 1;
                let snapshot = Self::poll(
                    self.client.clone(),
                    self.server_id.clone(),
                    self.generation,
                )
                .await;
                self.publish(snapshot);
                let _ = respond_to.send(());
                true
            }

            Some(PollerCommand::Shutdown) => {
                debug!("received shutdown command");
                false
            }

            None => {
                debug!("command channel closed, shutting down");
                false
            }
        }
    }

    /// One fetch-and-derive cycle; owns its inputs so it can run while the
    /// actor keeps servicing commands.
    async fn poll(client: MonitorClient, server_id: String, generation: u64) -> ServerSnapshot {
        let (metrics, services) = tokio::join!(
            client.list_metrics(&server_id),
            client.list_service_status(&server_id),
        );
        let now = Utc::now();

        match (metrics, services) {
            (Ok(metrics), Ok(services)) => {
                trace!(
                    "fetched {} metric records, {} service records",
                    metrics.len(),
                    services.len()
                );

                ServerSnapshot {
                    series: project(&metrics),
                    services,
                    error: None,
                    generation,
                    refreshed_at: Some(now),
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("failed to fetch server detail: {e}");

                ServerSnapshot {
                    series: Default::default(),
                    services: Vec::new(),
                    error: Some(format!("Failed to load data: {e}")),
                    generation,
                    refreshed_at: Some(now),
                }
            }
        }
    }

    fn publish(&self, snapshot: ServerSnapshot) {
        self.snapshot_tx.send_replace(snapshot);
    }
}

/// Handle for a running server detail poller
///
/// Spawned when a detail view activates and shut down when it goes away;
/// dropping the handle stops the actor too.
#[derive(Debug)]
pub struct ServerPollerHandle {
    sender: mpsc::Sender<PollerCommand>,
    pub server_id: String,
}

impl ServerPollerHandle {
    /// Spawn a poller for `server_id`; the first poll fires immediately.
    pub fn spawn(
        client: MonitorClient,
        server_id: String,
        poll_interval: Duration,
    ) -> (Self, watch::Receiver<ServerSnapshot>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (snapshot_tx, snapshot_rx) = watch::channel(ServerSnapshot::default());

        let actor = ServerPollerActor {
            client,
            server_id: server_id.clone(),
            command_rx: cmd_rx,
            snapshot_tx,
            interval_duration: poll_interval,
            generation: 0,
        };

        tokio::spawn(actor.run());

        (
            Self {
                sender: cmd_tx,
                server_id,
            },
            snapshot_rx,
        )
    }

    /// Trigger an immediate poll and wait until its snapshot is published.
    pub async fn poll_now(&self) -> anyhow::Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::PollNow { respond_to: tx })
            .await
            .map_err(|_| anyhow::anyhow!("server poller is not running"))?;

        rx.await
            .map_err(|_| anyhow::anyhow!("server poller dropped the request"))?;
        Ok(())
    }

    /// Stop the poller; an in-flight fetch is discarded unapplied.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.sender
            .send(PollerCommand::Shutdown)
            .await
            .map_err(|_| anyhow::anyhow!("server poller is not running"))?;
        Ok(())
    }
}
