//! Connection and event-queue driver for the read loop.

use super::dispatch::WaylandState;
use super::WaylandError;
use crate::command::Command;
use crate::controller::{ControllerError, OutputController, Reply};
use crate::logging::REQUEST;
use crate::output::ConfigurationId;
use crate::transaction::Outcome;
use log::{debug, info, warn};
use std::io::Write;
use wayland_client::{Connection, EventQueue, QueueHandle};

/// A connected output-management client.
///
/// # Typical usage
///
/// ```ignore
/// let mut client = WaylandClient::connect(OutputController::new("log.txt"))?;
/// client.sync()?;
/// let cmd = client.controller().parse("list_outputs")?;
/// client.execute(cmd, &mut std::io::stdout())?;
/// client.shutdown()?;
/// ```
pub struct WaylandClient {
    connection: Connection,
    queue: EventQueue<WaylandState>,
    qh: QueueHandle<WaylandState>,
    state: WaylandState,
}

impl WaylandClient {
    /// Connect to `$WAYLAND_DISPLAY`, bind the output manager and wait for
    /// the first snapshot.
    pub fn connect(controller: OutputController) -> Result<Self, WaylandError> {
        let connection = Connection::connect_to_env()?;
        info!("connected to {}", std::env::var("WAYLAND_DISPLAY").unwrap_or_default());

        let queue = connection.new_event_queue();
        let qh = queue.handle();
        connection.display().get_registry(&qh, ());
        info!(target: REQUEST, "wl_display.get_registry");

        let mut client = Self {
            connection,
            queue,
            qh,
            state: WaylandState::new(controller),
        };

        // First roundtrip binds the manager, the second delivers its heads.
        client.sync()?;
        if client.state.manager.is_none() {
            return Err(WaylandError::NoOutputManager);
        }
        client.sync()?;
        Ok(client)
    }

    pub fn controller(&self) -> &OutputController {
        &self.state.controller
    }

    /// Process every event the compositor has sent so far.
    pub fn sync(&mut self) -> Result<(), WaylandError> {
        let n = self.queue.roundtrip(&mut self.state)?;
        debug!("roundtrip dispatched {} event(s)", n);
        Ok(())
    }

    /// Run one parsed command against the live outputs.
    pub fn execute<W: Write>(&mut self, cmd: Command, out: &mut W) -> Result<Reply, ControllerError> {
        let (controller, mut transport) = self.state.split(&self.qh);
        controller.handle(cmd, &mut transport, out)
    }

    /// Block until configuration `id` has its outcome, then refresh the
    /// snapshot so the next command sees the result.
    pub fn wait_for_outcome(&mut self, id: ConfigurationId) -> Result<Option<Outcome>, WaylandError> {
        while self
            .state
            .controller
            .pending()
            .is_some_and(|txn| txn.id() == id)
        {
            self.queue.blocking_dispatch(&mut self.state)?;
        }
        let outcome = match self.state.controller.take_outcome() {
            Some((got, outcome)) if got == id => Some(outcome),
            other => {
                warn!("no outcome recorded for {} (got {:?})", id, other);
                None
            }
        };
        self.sync()?;
        Ok(outcome)
    }

    /// Release every handle, stop the manager and flush the connection.
    pub fn shutdown(mut self) -> Result<(), WaylandError> {
        info!("cleaning up");
        let (controller, mut transport) = self.state.split(&self.qh);
        controller.shutdown(&mut transport);
        self.sync()?;

        if let Some(manager) = self.state.manager.take() {
            manager.stop();
            info!(target: REQUEST, "zwlr_output_manager_v1.stop");
        }
        self.sync()?;
        if !self.state.proxies.is_empty() {
            debug!("proxies left at exit: {:?}", self.state.proxies);
        }
        self.connection.flush()?;
        Ok(())
    }
}
