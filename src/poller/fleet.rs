//! Fleet poller - keeps the server list and liveness judgments current

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::interval;
use tracing::{debug, instrument, trace, warn};

use crate::client::MonitorClient;
use crate::liveness::{STALE_THRESHOLD_MS, derive_view};

use super::messages::{FleetSnapshot, PollerCommand};

/// Actor that polls `GET /servers` on a fixed cadence
///
/// Polls are serialized: the loop awaits each fetch before the next tick can
/// fire, so at most one request is in flight and snapshots apply in start
/// order.
struct FleetPollerActor {
    client: MonitorClient,
    command_rx: mpsc::Receiver<PollerCommand>,
    snapshot_tx: watch::Sender<FleetSnapshot>,
    interval_duration: Duration,
    generation: u64,
}

impl FleetPollerActor {
    #[instrument(skip(self))]
    async fn run(mut self) {
        debug!("starting fleet poller");

        // First tick fires immediately, so the view fills on activation.
        let mut ticker = interval(self.interval_duration);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // The fetch owns a client clone so the command channel
                    // stays pollable beside it. A command arriving mid-fetch
                    // wins; shutdown drops the in-flight response without
                    // applying it.
                    self.generation += 1;
                    let fetch = Self::poll(self.client.clone(), self.generation);

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

        debug!("fleet poller stopped");
    }

    /// Returns false when the actor should exit.
    async fn handle_command(&mut self, cmd: Option<PollerCommand>) -> bool {
        match cmd {
            Some(PollerCommand::PollNow { respond_to }) => {
                debug!("received PollNow command");
                self.generation += 1;
                let snapshot = Self::poll(self.client.clone(), self.generation).await;
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

    /// One fetch-and-derive cycle; owns its client so it can run while the
    /// actor keeps servicing commands.
    async fn poll(client: MonitorClient, generation: u64) -> FleetSnapshot {
        let result = client.list_servers().await;
        let now = Utc::now();

        match result {
            Ok(records) => {
                trace!("fetched {} server records", records.len());

                FleetSnapshot {
                    servers: records.into_iter().map(|r| derive_view(r, now)).collect(),
                    error: None,
                    generation,
                    refreshed_at: Some(now),
                }
            }
            Err(e) => {
                warn!("failed to fetch server list: {e}");

                FleetSnapshot {
                    servers: Vec::new(),
                    error: Some(format!("Failed to load servers: {e}")),
                    generation,
                    refreshed_at: Some(now),
                }
            }
        }
    }

    fn publish(&self, snapshot: FleetSnapshot) {
        // Receivers may all be gone during teardown; nothing to do then.
        self.snapshot_tx.send_replace(snapshot);
    }
}

/// Handle for a running fleet poller
///
/// Dropping the handle closes the command channel and stops the actor.
#[derive(Debug)]
pub struct FleetPollerHandle {
    sender: mpsc::Sender<PollerCommand>,
}

impl FleetPollerHandle {
    /// Spawn a fleet poller polling at `poll_interval`
    ///
    /// Returns the handle plus the watch receiver carrying the latest
    /// snapshot. The first poll fires immediately.
    pub fn spawn(
        client: MonitorClient,
        poll_interval: Duration,
    ) -> (Self, watch::Receiver<FleetSnapshot>) {
        if poll_interval.as_millis() as i64 >= STALE_THRESHOLD_MS {
            warn!(
                "poll interval {}ms is not below the staleness threshold {}ms; liveness will flap",
                poll_interval.as_millis(),
                STALE_THRESHOLD_MS
            );
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (snapshot_tx, snapshot_rx) = watch::channel(FleetSnapshot::default());

        let actor = FleetPollerActor {
            client,
            command_rx: cmd_rx,
            snapshot_tx,
            interval_duration: poll_interval,
            generation: 0,
        };

        tokio::spawn(actor.run());

        (Self { sender: cmd_tx }, snapshot_rx)
    }

    /// Trigger an immediate poll and wait until its snapshot is published.
    pub async fn poll_now(&self) -> anyhow::Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::PollNow { respond_to: tx })
            .await
            .map_err(|_| anyhow::anyhow!("fleet poller is not running"))?;

        rx.await
            .map_err(|_| anyhow::anyhow!("fleet poller dropped the request"))?;
        Ok(())
    }

    /// Stop the poller; an in-flight fetch is discarded unapplied.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.sender
            .send(PollerCommand::Shutdown)
            .await
            .map_err(|_| anyhow::anyhow!("fleet poller is not running"))?;
        Ok(())
    }
}
