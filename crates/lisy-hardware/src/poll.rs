//! Background switch poll loop.
//!
//! The loop is the only task that asks the board for unsolicited data. Each
//! cycle sends "get changed switches" and reads one status byte:
//!
//! - `127`: nothing changed; idle for the poll interval with the connection
//!   unlocked so device commands can run.
//! - anything else: update the switch cache, then report a
//!   [`PlatformEvent::SwitchChanged`] to the host.
//!
//! Cancellation ends the loop cleanly. A failed poll reports
//! [`PlatformEvent::PollFailed`] and ends the loop with the error.

use crate::error::{HardwareError, Result};
use crate::types::{PlatformEvent, SwitchEvent, SwitchStates};
use lisy_core::constants::BOARD_NAME;
use lisy_core::{SwitchNumber, SwitchStatus};
use lisy_network::Connection;
use lisy_protocol::Command;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Switch poll task state.
#[derive(Debug)]
pub struct PollLoop {
    connection: Arc<Connection>,
    switches: Arc<RwLock<SwitchStates>>,
    events: mpsc::Sender<PlatformEvent>,
    interval: Duration,
    cancel: CancellationToken,
}

impl PollLoop {
    pub fn new(
        connection: Arc<Connection>,
        switches: Arc<RwLock<SwitchStates>>,
        events: mpsc::Sender<PlatformEvent>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            connection,
            switches,
            events,
            interval,
            cancel,
        }
    }

    /// Run the loop on a new Tokio task.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    /// Poll until cancelled or until a poll fails.
    ///
    /// Cancelling while a request waits for its reply closes the connection.
    ///
    /// # Errors
    ///
    /// Returns the first transport or protocol error.
    pub async fn run(self) -> Result<()> {
        info!(interval = ?self.interval, "Switch poll loop started");
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("Switch poll loop cancelled");
                    return Ok(());
                }
                result = self.cycle() => {
                    if let Err(e) = result {
                        error!("Switch poll loop failed: {}", e);
                        return Err(e);
                    }
                }
            }
        }
    }

    async fn cycle(&self) -> Result<()> {
        match self.poll().await {
            Ok(SwitchStatus::NoChange) => {
                trace!("No switch change");
                tokio::time::sleep(self.interval).await;
                Ok(())
            }
            Ok(SwitchStatus::Changed { number, active }) => {
                self.dispatch(number, active).await;
                Ok(())
            }
            Err(e) => {
                let event = PlatformEvent::PollFailed {
                    error: e.to_string(),
                };
                let _ = self.events.send(event).await;
                Err(e)
            }
        }
    }

    async fn poll(&self) -> Result<SwitchStatus> {
        let status = self
            .connection
            .request(Command::GetChangedSwitches)
            .await?
            .into_byte()?;
        SwitchStatus::from_byte(status).map_err(|e| {
            HardwareError::protocol_violation(format!("poll status {status}: {e}"))
        })
    }

    async fn dispatch(&self, number: SwitchNumber, active: bool) {
        debug!(switch = %number, active, "Switch changed");
        self.switches.write().insert(number, active);

        let event = PlatformEvent::SwitchChanged(SwitchEvent {
            number,
            active,
            source: BOARD_NAME,
        });
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Event channel full, waiting for the host");
                let _ = self.events.send(event).await;
            }
            Err(TrySendError::Closed(_)) => {
                trace!(switch = %number, "Event receiver dropped");
            }
        }
    }
}
