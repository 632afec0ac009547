//! Main application logic
//!
//! The app owns the fleet poller for its whole lifetime and a server detail
//! poller only while the detail view is open: entering the view spawns the
//! poller, leaving it shuts the poller down. The UI consumes whatever
//! snapshot is current; it never derives state of its own.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use tokio::sync::watch;

use crate::client::MonitorClient;
use crate::config::Config;
use crate::poller::{FleetPollerHandle, FleetSnapshot, ServerPollerHandle, ServerSnapshot};
use crate::ui;

/// Detail view for one selected server
struct DetailView {
    handle: ServerPollerHandle,
    snapshot_rx: watch::Receiver<ServerSnapshot>,
}

/// What the UI renders on the next frame
pub struct AppState {
    pub fleet: FleetSnapshot,
    pub selected_server: usize,
    /// `Some` while the detail view is open: (server_id, latest snapshot)
    pub detail: Option<(String, ServerSnapshot)>,
}

impl AppState {
    fn new() -> Self {
        Self {
            fleet: FleetSnapshot::default(),
            selected_server: 0,
            detail: None,
        }
    }

    fn select_next(&mut self) {
        if !self.fleet.servers.is_empty() {
            self.selected_server = (self.selected_server + 1) % self.fleet.servers.len();
        }
    }

    fn select_previous(&mut self) {
        if !self.fleet.servers.is_empty() {
            self.selected_server = if self.selected_server == 0 {
                self.fleet.servers.len() - 1
            } else {
                self.selected_server - 1
            };
        }
    }

    fn clamp_selection(&mut self) {
        if self.selected_server >= self.fleet.servers.len() && !self.fleet.servers.is_empty() {
            self.selected_server = self.fleet.servers.len() - 1;
        }
    }
}

/// Main TUI application
pub struct App {
    config: Config,
    client: MonitorClient,
    state: AppState,
    fleet_handle: FleetPollerHandle,
    fleet_rx: watch::Receiver<FleetSnapshot>,
    detail: Option<DetailView>,
}

impl App {
    /// Create the application and start the fleet poller
    pub fn new(config: Config) -> Result<Self> {
        let client = MonitorClient::new(&config.hub_url, config.request_timeout())?;
        let (fleet_handle, fleet_rx) =
            FleetPollerHandle::spawn(client.clone(), config.poll_interval());

        Ok(Self {
            config,
            client,
            state: AppState::new(),
            fleet_handle,
            fleet_rx,
            detail: None,
        })
    }

    /// Run the application until the user quits
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_event_loop(&mut terminal).await;

        // Stop pollers before giving the terminal back.
        self.close_detail().await;
        self.fleet_handle.shutdown().await.ok();

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn run_event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        loop {
            self.sync_snapshots();

            terminal.draw(|f| ui::render(f, &self.state))?;

            if event::poll(std::time::Duration::from_millis(100))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
                && self.handle_key_event(key.code).await?
            {
                break; // Quit
            }
        }

        Ok(())
    }

    /// Pull the latest published snapshots into render state
    fn sync_snapshots(&mut self) {
        self.state.fleet = self.fleet_rx.borrow_and_update().clone();
        self.state.clamp_selection();

        self.state.detail = self.detail.as_mut().map(|view| {
            (
                view.handle.server_id.clone(),
                view.snapshot_rx.borrow_and_update().clone(),
            )
        });
    }

    /// Handle keyboard event; returns true to quit
    async fn handle_key_event(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                return Ok(true);
            }
            KeyCode::Esc => {
                if self.detail.is_some() {
                    self.close_detail().await;
                } else {
                    return Ok(true);
                }
            }
            KeyCode::Enter => {
                if self.detail.is_none()
                    && let Some(server) = self.state.fleet.servers.get(self.state.selected_server)
                {
                    self.open_detail(server.server_id.clone());
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.state.select_next();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.select_previous();
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.fleet_handle.poll_now().await.ok();
                if let Some(view) = &self.detail {
                    view.handle.poll_now().await.ok();
                }
            }
            _ => {}
        }

        Ok(false)
    }

    /// Spawn the detail poller for one server (acquire on activate)
    fn open_detail(&mut self, server_id: String) {
        let (handle, snapshot_rx) = ServerPollerHandle::spawn(
            self.client.clone(),
            server_id,
            self.config.poll_interval(),
        );

        self.detail = Some(DetailView {
            handle,
            snapshot_rx,
        });
    }

    /// Shut the detail poller down (release on deactivate)
    ///
    /// A fetch still in flight is discarded by the actor, so nothing can
    /// mutate state belonging to the closed view.
    async fn close_detail(&mut self) {
        if let Some(view) = self.detail.take() {
            view.handle.shutdown().await.ok();
        }
        self.state.detail = None;
    }
}
