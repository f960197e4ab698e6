//! Startup sequence that identifies and sizes the board.
//!
//! ```text
//! Reset ─> Identify ─> QueryCapacities ─> BulkSwitchRead ─> Running
//!   └──────────┴──────────────┴─────────────────┴──────────> Failed
//! ```
//!
//! Every step is a strict request/response exchange. Any unexpected reply
//! fails the whole sequence with a protocol violation; nothing is retried.

use crate::error::{HardwareError, Result};
use crate::types::{HandshakeOutcome, SwitchStates};
use lisy_core::constants::RESET_OK;
use lisy_core::{HardwareProfile, SwitchNumber, SystemType};
use lisy_network::Connection;
use lisy_protocol::Command;
use std::fmt;
use tracing::{debug, error, info};

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Reset,
    Identify,
    QueryCapacities,
    BulkSwitchRead,
    /// Handshake succeeded; polling may start.
    Running,
    /// Handshake aborted.
    Failed,
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reset => "RESET",
            Self::Identify => "IDENTIFY",
            Self::QueryCapacities => "QUERY_CAPACITIES",
            Self::BulkSwitchRead => "BULK_SWITCH_READ",
            Self::Running => "RUNNING",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// One handshake attempt over a connection.
#[derive(Debug)]
pub struct Handshake<'a> {
    connection: &'a Connection,
    state: HandshakeState,
}

impl<'a> Handshake<'a> {
    pub fn new(connection: &'a Connection) -> Self {
        Self {
            connection,
            state: HandshakeState::Reset,
        }
    }

    /// Current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Run the sequence to completion.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::ProtocolViolation`] for a non-zero reset
    /// code, an unknown identifier or a switch state outside {0, 1}, and
    /// transport errors as they occur.
    pub async fn run(&mut self) -> Result<HandshakeOutcome> {
        info!("Starting LISY handshake");
        match self.steps().await {
            Ok(outcome) => {
                self.transition(HandshakeState::Running);
                info!(profile = %outcome.profile, "LISY handshake complete");
                Ok(outcome)
            }
            Err(e) => {
                error!(state = %self.state, "LISY handshake failed: {}", e);
                self.transition(HandshakeState::Failed);
                Err(e)
            }
        }
    }

    async fn steps(&mut self) -> Result<HandshakeOutcome> {
        self.reset().await?;

        self.transition(HandshakeState::Identify);
        let system_type = self.identify().await?;

        self.transition(HandshakeState::QueryCapacities);
        let profile = self.query_capacities(system_type).await?;

        self.transition(HandshakeState::BulkSwitchRead);
        let switches = self.read_switches().await?;

        Ok(HandshakeOutcome { profile, switches })
    }

    async fn reset(&mut self) -> Result<()> {
        let code = self.connection.request(Command::Reset).await?.into_byte()?;
        if code != RESET_OK {
            return Err(HardwareError::protocol_violation(format!(
                "reset returned {code}"
            )));
        }
        Ok(())
    }

    async fn identify(&mut self) -> Result<SystemType> {
        let identifier = self
            .connection
            .request(Command::GetConnectedHardware)
            .await?
            .into_string()?;
        let system_type = SystemType::from_identifier(&identifier)?;
        info!("Connected to {} hardware", system_type);
        Ok(system_type)
    }

    async fn query_capacities(&mut self, system_type: SystemType) -> Result<HardwareProfile> {
        let lamp_count = self.query_count(Command::GetNumberOfLamps).await?;
        let solenoid_count = self.query_count(Command::GetNumberOfSolenoids).await?;
        let display_count = self.query_count(Command::GetNumberOfDisplays).await?;

        Ok(HardwareProfile {
            system_type,
            lamp_count,
            solenoid_count,
            display_count,
        })
    }

    async fn query_count(&mut self, command: Command) -> Result<u8> {
        debug!(%command, "Querying capacity");
        let count = self.connection.request(command).await?.into_byte()?;
        debug!(count, "Capacity reply");
        Ok(count)
    }

    async fn read_switches(&mut self) -> Result<SwitchStates> {
        let mut switches = SwitchStates::with_capacity(64);
        for number in SwitchNumber::all() {
            let active = self
                .connection
                .request(Command::GetSwitchStatus(number))
                .await?
                .into_bool()
                .map_err(|e| {
                    HardwareError::protocol_violation(format!("switch {number}: {e}"))
                })?;
            switches.insert(number, active);
        }
        debug!(
            active = switches.values().filter(|a| **a).count(),
            "Read initial switch states"
        );
        Ok(switches)
    }

    fn transition(&mut self, next: HandshakeState) {
        debug!("Handshake {} -> {}", self.state, next);
        self.state = next;
    }
}
