//! Scripted LISY board for testing and development.
//!
//! The mock speaks the real byte protocol on one end of a
//! [`tokio::io::duplex`] pipe and hands back a [`Connection`] on the other
//! end, so everything above the transport runs unmodified against it.

use lisy_core::constants::{
    CMD_GET_API_VERSION, CMD_GET_CHANGED_SWITCHES, CMD_GET_CONNECTED_HARDWARE,
    CMD_GET_LISY_VERSION, CMD_GET_NUMBER_OF_DISPLAYS, CMD_GET_NUMBER_OF_LAMPS,
    CMD_GET_NUMBER_OF_SOLENOIDS, CMD_GET_SWITCH_STATUS, CMD_LAMP_OFF, CMD_LAMP_ON, CMD_RESET,
    CMD_SET_DISPLAY_BASE, CMD_SET_SOLENOID_PULSE_TIME, CMD_SOLENOID_OFF, CMD_SOLENOID_ON,
    CMD_SOLENOID_PULSE, MAX_DISPLAYS, RESET_OK, STRING_TERMINATOR, SWITCH_NUMBER_MASK,
    SWITCH_STATE_BIT, SWITCH_STATUS_NO_CHANGE,
};
use lisy_network::Connection;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

const PIPE_CAPACITY: usize = 1024;

/// Behaviour of a simulated board.
///
/// Defaults to a System 1 board with 36 lamps, 9 solenoids, 5 displays and
/// every switch open.
///
/// # Examples
///
/// ```
/// use lisy_hardware::mock::MockController;
/// use lisy_protocol::{Command, Response};
///
/// #[tokio::main]
/// async fn main() {
///     let (connection, _board) = MockController::new().identifier("LISY80").spawn();
///
///     let reply = connection.request(Command::GetConnectedHardware).await.unwrap();
///     assert_eq!(reply, Response::String(b"LISY80".to_vec()));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockController {
    identifier: String,
    reset_code: u8,
    lamp_count: u8,
    solenoid_count: u8,
    display_count: u8,
    lisy_version: String,
    api_version: String,

    /// Raw switch status replies; missing entries answer 0.
    switch_replies: HashMap<u8, u8>,
}

impl Default for MockController {
    fn default() -> Self {
        Self {
            identifier: "LISY1".to_string(),
            reset_code: RESET_OK,
            lamp_count: 36,
            solenoid_count: 9,
            display_count: 5,
            lisy_version: "5.28".to_string(),
            api_version: "0.09".to_string(),
            switch_replies: HashMap::new(),
        }
    }
}

impl MockController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to the identify command.
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Reply to the reset command.
    pub fn reset_code(mut self, code: u8) -> Self {
        self.reset_code = code;
        self
    }

    pub fn lamps(mut self, count: u8) -> Self {
        self.lamp_count = count;
        self
    }

    pub fn solenoids(mut self, count: u8) -> Self {
        self.solenoid_count = count;
        self
    }

    pub fn displays(mut self, count: u8) -> Self {
        self.display_count = count;
        self
    }

    /// Firmware and API version strings.
    pub fn versions(mut self, lisy: impl Into<String>, api: impl Into<String>) -> Self {
        self.lisy_version = lisy.into();
        self.api_version = api.into();
        self
    }

    /// Initial state of one switch.
    pub fn switch(self, number: u8, active: bool) -> Self {
        self.switch_reply(number, u8::from(active))
    }

    /// Raw byte returned for a status query of `number`, valid or not.
    pub fn switch_reply(mut self, number: u8, reply: u8) -> Self {
        self.switch_replies.insert(number, reply);
        self
    }

    /// Start the board on a background task.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn spawn(self) -> (Connection, MockControllerHandle) {
        let (host, board) = tokio::io::duplex(PIPE_CAPACITY);

        let shared = Arc::new(Shared {
            state: Mutex::new(BoardState {
                switch_replies: self.switch_replies.clone(),
                changes: VecDeque::new(),
                frames: Vec::new(),
            }),
            polls: AtomicUsize::new(0),
        });
        let cancel = CancellationToken::new();

        let board_task = Board {
            script: self,
            shared: Arc::clone(&shared),
        };
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => debug!("Mock LISY disconnected"),
                result = board_task.serve(board) => match result {
                    Ok(()) => debug!("Mock LISY host hung up"),
                    Err(e) => debug!("Mock LISY stopped: {}", e),
                },
            }
        });

        let handle = MockControllerHandle { shared, cancel };
        (Connection::from_stream(host, "mock"), handle)
    }
}

/// Handle for scripting and inspecting a running mock board.
///
/// Cloneable; every clone controls the same board.
#[derive(Debug, Clone)]
pub struct MockControllerHandle {
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

impl MockControllerHandle {
    /// Queue a switch change for the next "get changed switches" poll.
    pub fn push_switch_change(&self, number: u8, active: bool) {
        let status = if active { number | SWITCH_STATE_BIT } else { number };
        self.push_status(status);
    }

    /// Queue a raw poll reply byte.
    pub fn push_status(&self, status: u8) {
        self.shared.state.lock().changes.push_back(status);
    }

    /// Whether queued changes are still waiting to be polled.
    pub fn has_pending_changes(&self) -> bool {
        !self.shared.state.lock().changes.is_empty()
    }

    /// Every frame received so far except polls, in arrival order.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.shared.state.lock().frames.clone()
    }

    /// Forget the recorded frames.
    pub fn clear_frames(&self) {
        self.shared.state.lock().frames.clear();
    }

    /// Number of "get changed switches" polls answered.
    pub fn poll_count(&self) -> usize {
        self.shared.polls.load(Ordering::SeqCst)
    }

    /// Drop the board end of the pipe, as if the cable were pulled.
    pub fn disconnect(&self) {
        self.cancel.cancel();
    }
}

#[derive(Debug)]
struct Shared {
    state: Mutex<BoardState>,
    polls: AtomicUsize,
}

#[derive(Debug)]
struct BoardState {
    switch_replies: HashMap<u8, u8>,
    changes: VecDeque<u8>,
    frames: Vec<Vec<u8>>,
}

struct Board {
    script: MockController,
    shared: Arc<Shared>,
}

impl Board {
    async fn serve(&self, mut stream: DuplexStream) -> io::Result<()> {
        loop {
            let code = match stream.read_u8().await {
                Ok(code) => code,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e),
            };

            let mut frame = vec![code];
            let payload_len = match code {
                CMD_LAMP_ON | CMD_LAMP_OFF | CMD_SOLENOID_ON | CMD_SOLENOID_OFF
                | CMD_SOLENOID_PULSE | CMD_GET_SWITCH_STATUS => 1,
                CMD_SET_SOLENOID_PULSE_TIME => 3,
                _ => 0,
            };
            for _ in 0..payload_len {
                frame.push(stream.read_u8().await?);
            }
            if (CMD_SET_DISPLAY_BASE..CMD_SET_DISPLAY_BASE + MAX_DISPLAYS).contains(&code) {
                loop {
                    let byte = stream.read_u8().await?;
                    frame.push(byte);
                    if byte == STRING_TERMINATOR {
                        break;
                    }
                }
            }

            let reply = self.reply(&frame);
            if let Some(reply) = reply {
                stream.write_all(&reply).await?;
            }
        }
    }

    fn reply(&self, frame: &[u8]) -> Option<Vec<u8>> {
        let code = frame[0];
        if code == CMD_GET_CHANGED_SWITCHES {
            self.shared.polls.fetch_add(1, Ordering::SeqCst);
            return Some(vec![self.next_change()]);
        }

        trace!(?frame, "Mock LISY received");
        let mut state = self.shared.state.lock();
        state.frames.push(frame.to_vec());

        let script = &self.script;
        match code {
            CMD_RESET => Some(vec![script.reset_code]),
            CMD_GET_CONNECTED_HARDWARE => Some(terminated(&script.identifier)),
            CMD_GET_LISY_VERSION => Some(terminated(&script.lisy_version)),
            CMD_GET_API_VERSION => Some(terminated(&script.api_version)),
            CMD_GET_NUMBER_OF_LAMPS => Some(vec![script.lamp_count]),
            CMD_GET_NUMBER_OF_SOLENOIDS => Some(vec![script.solenoid_count]),
            CMD_GET_NUMBER_OF_DISPLAYS => Some(vec![script.display_count]),
            CMD_GET_SWITCH_STATUS => {
                let reply = state.switch_replies.get(&frame[1]).copied().unwrap_or(0);
                Some(vec![reply])
            }
            _ => None,
        }
    }

    fn next_change(&self) -> u8 {
        let mut state = self.shared.state.lock();
        let Some(status) = state.changes.pop_front() else {
            return SWITCH_STATUS_NO_CHANGE;
        };
        let active = status & SWITCH_STATE_BIT != 0;
        state
            .switch_replies
            .insert(status & SWITCH_NUMBER_MASK, u8::from(active));
        status
    }
}

fn terminated(text: &str) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(STRING_TERMINATOR);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use lisy_core::SwitchNumber;
    use lisy_protocol::{Command, Response};

    #[tokio::test]
    async fn test_answers_queries() {
        let (connection, board) = MockController::new().lamps(12).switch(5, true).spawn();

        let lamps = connection.request(Command::GetNumberOfLamps).await.unwrap();
        assert_eq!(lamps, Response::Byte(12));

        let status = connection
            .request(Command::GetSwitchStatus(SwitchNumber::new(5).unwrap()))
            .await
            .unwrap();
        assert_eq!(status, Response::Byte(1));

        assert_eq!(board.frames(), vec![vec![3], vec![40, 5]]);
    }

    #[tokio::test]
    async fn test_poll_queue() {
        let (connection, board) = MockController::new().spawn();
        board.push_switch_change(5, true);

        let first = connection.request(Command::GetChangedSwitches).await.unwrap();
        let second = connection.request(Command::GetChangedSwitches).await.unwrap();

        assert_eq!(first, Response::Byte(133));
        assert_eq!(second, Response::Byte(127));
        assert_eq!(board.poll_count(), 2);
        assert!(board.frames().is_empty());

        let status = connection
            .request(Command::GetSwitchStatus(SwitchNumber::new(5).unwrap()))
            .await
            .unwrap();
        assert_eq!(status, Response::Byte(1));
    }

    #[tokio::test]
    async fn test_records_fire_and_forget_frames() {
        let (connection, board) = MockController::new().spawn();

        connection
            .send(Command::SetDisplay {
                display: 1,
                text: "42".to_string(),
            })
            .await
            .unwrap();
        connection.send(Command::SolenoidPulse(3)).await.unwrap();
        // A round trip guarantees both frames were consumed.
        connection.request(Command::GetNumberOfDisplays).await.unwrap();

        assert_eq!(
            board.frames(),
            vec![vec![31, b'4', b'2', 0], vec![23, 3], vec![6]]
        );
    }

    #[tokio::test]
    async fn test_disconnect_ends_connection() {
        let (connection, board) = MockController::new().spawn();
        board.disconnect();

        let result = connection.request(Command::GetChangedSwitches).await;
        assert!(result.is_err());
    }
}
