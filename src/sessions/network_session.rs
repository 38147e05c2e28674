use std::collections::VecDeque;

use tracing::{trace, warn};
use web_time::Instant;

use crate::clock;
use crate::network::messages::{
    ChatMessagePayload, ClientMessage, ClientPacket, InputFlags, MatchmakingRequest,
    PlayerInputPayload, ServerMessage, ServerPacket, PROTOCOL_VERSION,
};
use crate::network::session_stats::SessionStats;
use crate::sessions::config::SessionConfig;
use crate::sessions::event_drain::EventDrain;
use crate::{
    ConnectionState, DriftlineError, PlayerId, RoomId, Sequence, SessionEvent, Transport,
};

/// Handshake progress while in [`ConnectionState::Connecting`].
#[derive(Debug, Clone, Copy)]
struct ConnectAttempt {
    started: Instant,
    last_request: Instant,
    attempts: u32,
}

/// An outstanding liveness ping awaiting its pong.
#[derive(Debug, Clone, Copy)]
struct PendingPing {
    nonce: u64,
    sent_at: Instant,
}

/// [`NetworkSession`] is the single point of contact with the remote game
/// server.
///
/// It owns one [`Transport`], translates every recognized inbound wire message
/// into a [`SessionEvent`], and exposes a fixed catalogue of fire-and-forget
/// outbound actions. All inbound handling happens inside [`poll`]; call it
/// once per game tick and drain [`events`] afterwards.
///
/// Outbound calls made while the session is not connected are silently dropped
/// (logged at trace level) - they never fail or panic.
///
/// # Example
///
/// ```
/// use driftline::{loopback_pair, SessionBuilder, SessionEvent};
///
/// let (transport, _server) = loopback_pair();
/// let mut session = SessionBuilder::new()
///     .with_auth_token("secret")
///     .start_session(transport)
///     .unwrap();
///
/// session.connect().unwrap();
/// // ... per tick:
/// session.poll();
/// for event in session.events() {
///     match event {
///         SessionEvent::Connected { .. } => { /* ready to play */ }
///         _ => {}
///     }
/// }
/// ```
///
/// [`poll`]: NetworkSession::poll
/// [`events`]: NetworkSession::events
pub struct NetworkSession<T>
where
    T: Transport,
{
    transport: T,
    config: SessionConfig,
    auth_token: Option<String>,

    // session state
    state: ConnectionState,
    player_id: Option<PlayerId>,
    room_id: Option<RoomId>,

    // handshake / liveness bookkeeping
    connect_attempt: Option<ConnectAttempt>,
    last_ping_sent: Option<Instant>,
    pending_ping: Option<PendingPing>,
    next_ping_nonce: u64,
    interrupted: bool,

    event_queue: VecDeque<SessionEvent>,
    stats: SessionStats,
}

impl<T: Transport> NetworkSession<T> {
    pub(crate) fn new(transport: T, config: SessionConfig, auth_token: Option<String>) -> Self {
        Self {
            transport,
            config,
            auth_token,
            state: ConnectionState::Disconnected,
            player_id: None,
            room_id: None,
            connect_attempt: None,
            last_ping_sent: None,
            pending_ping: None,
            next_ping_nonce: 0,
            interrupted: false,
            event_queue: VecDeque::new(),
            stats: SessionStats::new(),
        }
    }

    // ==============
    // # LIFECYCLE  #
    // ==============

    /// Starts the connect handshake: transmits a connect request (with the
    /// configured auth token, if any) and begins retrying on the configured
    /// cadence. Completion is reported through the event queue:
    /// [`SessionEvent::Connected`] on acknowledgment,
    /// [`SessionEvent::ConnectFailed`] once the attempt budget or the connect
    /// timeout is exhausted, [`SessionEvent::ReconnectAttempt`] per retry.
    ///
    /// # Errors
    ///
    /// Returns [`DriftlineError::InvalidRequest`] if the session is already
    /// connecting or connected.
    pub fn connect(&mut self) -> Result<(), DriftlineError> {
        match self.state {
            ConnectionState::Connecting => {
                return Err(DriftlineError::InvalidRequest {
                    info: "connect already in progress".to_owned(),
                })
            }
            ConnectionState::Connected => {
                return Err(DriftlineError::InvalidRequest {
                    info: "session is already connected".to_owned(),
                })
            }
            ConnectionState::Disconnected => {}
        }

        let now = Instant::now();
        self.state = ConnectionState::Connecting;
        self.connect_attempt = Some(ConnectAttempt {
            started: now,
            last_request: now,
            attempts: 1,
        });
        self.send_connect_request();
        Ok(())
    }

    /// Tears the session down unconditionally. Idempotent - safe to call when
    /// not connected. A best-effort disconnect notice is sent if the session
    /// was connected; all session state (player id, room id, handshake and
    /// liveness bookkeeping) is cleared synchronously.
    ///
    /// Already-queued events remain drainable; no new ones are produced for a
    /// locally-initiated disconnect.
    pub fn disconnect(&mut self) {
        if self.state == ConnectionState::Connected {
            self.send_packet(ClientMessage::Disconnect);
        }
        self.state = ConnectionState::Disconnected;
        self.reset_session_state();
    }

    /// Drives the session: drains the transport, translates inbound messages
    /// into events, and advances handshake retries and liveness timers.
    ///
    /// Call once per game tick. Work is bounded by the number of packets
    /// received since the last call; nothing blocks.
    pub fn poll(&mut self) {
        let packets = self.transport.receive_all_messages();
        for packet in packets {
            self.handle_packet(packet);
        }
        self.advance_timers();
    }

    /// Returns all events produced since the last call, oldest first.
    pub fn events(&mut self) -> EventDrain<'_> {
        EventDrain::from_drain(self.event_queue.drain(..))
    }

    // ==============
    // # ACCESSORS  #
    // ==============

    /// The current connection state.
    #[must_use]
    pub fn current_state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the session is connected (handshake acknowledged, not torn
    /// down).
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// The player identifier assigned by the server, if connected.
    #[must_use]
    pub fn player_id(&self) -> Option<&PlayerId> {
        self.player_id.as_ref()
    }

    /// The current room, if the local player is in one.
    #[must_use]
    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    /// Statistics about this session.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    // =====================
    // # OUTBOUND CATALOGUE #
    // =====================
    //
    // All outbound calls are fire-and-forget: no acknowledgment tracking, and
    // a silent no-op (trace-logged) when the session is not connected.

    /// Requests matchmaking with the given parameters.
    pub fn request_matchmaking(&mut self, request: MatchmakingRequest) {
        if !self.guard_connected("matchmaking request") {
            return;
        }
        self.send_packet(ClientMessage::MatchmakingRequest(request));
    }

    /// Cancels an outstanding matchmaking request.
    pub fn cancel_matchmaking(&mut self) {
        if !self.guard_connected("matchmaking cancel") {
            return;
        }
        self.send_packet(ClientMessage::MatchmakingCancel);
    }

    /// Asks to join the given room. The room id is recorded only once the
    /// server confirms with a room-joined message.
    pub fn join_room(&mut self, room_id: &RoomId) {
        if !self.guard_connected("join room") {
            return;
        }
        self.send_packet(ClientMessage::JoinRoom {
            room_id: room_id.clone(),
        });
    }

    /// Leaves the current room, if any. Clears the locally-tracked room id
    /// immediately; the server is notified best-effort.
    pub fn leave_room(&mut self) {
        if !self.guard_connected("leave room") {
            return;
        }
        let Some(room_id) = self.room_id.take() else {
            trace!("dropping leave room: not in a room");
            return;
        };
        self.send_packet(ClientMessage::LeaveRoom { room_id });
    }

    /// Transmits one locally-applied input command. The payload is stamped
    /// with the current wall-clock time (zero if the clock is unusable).
    pub fn send_player_input(&mut self, sequence: Sequence, input: InputFlags) {
        if !self.guard_connected("player input") {
            return;
        }
        let payload = PlayerInputPayload {
            sequence,
            input,
            timestamp_ms: clock::millis_since_epoch().unwrap_or(0),
        };
        self.send_packet(ClientMessage::PlayerInput(payload));
    }

    /// Announces that the local player jumped.
    pub fn send_player_jump(&mut self) {
        if !self.guard_connected("player jump") {
            return;
        }
        self.send_packet(ClientMessage::PlayerJump);
    }

    /// Announces that the local player used a skill.
    pub fn use_skill(&mut self, skill_id: u32) {
        if !self.guard_connected("player skill") {
            return;
        }
        self.send_packet(ClientMessage::PlayerSkill { skill_id });
    }

    /// Announces that the local player collected an item.
    pub fn collect_item(&mut self, item_id: u64) {
        if !self.guard_connected("item collect") {
            return;
        }
        self.send_packet(ClientMessage::PlayerCollectItem { item_id });
    }

    /// Sends a chat message.
    pub fn send_chat_message(&mut self, payload: ChatMessagePayload) {
        if !self.guard_connected("chat message") {
            return;
        }
        self.send_packet(ClientMessage::ChatMessage(payload));
    }

    /// Sends a liveness ping immediately, independent of the automatic ping
    /// cadence. The pong surfaces as [`SessionEvent::PongReceived`].
    pub fn send_ping(&mut self) {
        if !self.guard_connected("ping") {
            return;
        }
        self.start_ping(Instant::now());
    }

    // =============
    // # INTERNALS #
    // =============

    fn guard_connected(&self, action: &str) -> bool {
        if self.state == ConnectionState::Connected {
            true
        } else {
            trace!("dropping {action}: session not connected");
            false
        }
    }

    fn send_packet(&mut self, body: ClientMessage) {
        self.transport.send(&ClientPacket::new(body));
        self.stats.packets_sent += 1;
    }

    fn send_connect_request(&mut self) {
        let token = self.auth_token.clone();
        self.send_packet(ClientMessage::Connect { auth_token: token });
    }

    fn reset_session_state(&mut self) {
        self.player_id = None;
        self.room_id = None;
        self.connect_attempt = None;
        self.last_ping_sent = None;
        self.pending_ping = None;
        self.interrupted = false;
    }

    fn push_event(&mut self, event: SessionEvent) {
        self.event_queue.push_back(event);
        // Bounded queue: unpolled sessions must not grow without limit.
        while self.event_queue.len() > self.config.event_queue_size {
            self.event_queue.pop_front();
        }
    }

    fn handle_packet(&mut self, packet: ServerPacket) {
        if packet.header.version != PROTOCOL_VERSION {
            warn!(
                "dropping server packet with protocol version {} (expected {})",
                packet.header.version, PROTOCOL_VERSION
            );
            return;
        }
        if self.state == ConnectionState::Disconnected {
            trace!("ignoring server packet while disconnected");
            return;
        }
        self.stats.packets_received += 1;
        if self.interrupted {
            self.interrupted = false;
            self.push_event(SessionEvent::NetworkResumed);
        }
        self.handle_server_message(packet.body);
    }

    /// Translates one recognized server message into a locally-named event,
    /// applying session state side effects first where the message calls for
    /// them.
    fn handle_server_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::ConnectionAck { player_id } => {
                self.state = ConnectionState::Connected;
                self.connect_attempt = None;
                self.player_id = Some(player_id.clone());
                self.push_event(SessionEvent::Connected { player_id });
            }
            ServerMessage::RoomJoined(room) => {
                self.room_id = Some(room.room_id.clone());
                self.push_event(SessionEvent::RoomJoined { room });
            }
            ServerMessage::RoomCreated(room) => {
                self.room_id = Some(room.room_id.clone());
                self.push_event(SessionEvent::RoomCreated { room });
            }
            ServerMessage::RoomPaused => self.push_event(SessionEvent::RoomPaused),
            ServerMessage::RoomResumed => self.push_event(SessionEvent::RoomResumed),
            ServerMessage::RoomEnded { reason } => {
                self.room_id = None;
                self.push_event(SessionEvent::RoomEnded { reason });
            }
            ServerMessage::PlayerJoinedRoom { player_id } => {
                self.push_event(SessionEvent::PlayerJoined { player_id });
            }
            ServerMessage::PlayerLeftRoom { player_id } => {
                self.push_event(SessionEvent::PlayerLeft { player_id });
            }
            ServerMessage::GameStateUpdate(update) => {
                self.push_event(SessionEvent::StateUpdate { update });
            }
            ServerMessage::PlayerInput { player_id, payload } => {
                self.push_event(SessionEvent::PeerInput { player_id, payload });
            }
            ServerMessage::PlayerJump { player_id } => {
                self.push_event(SessionEvent::PeerJump { player_id });
            }
            ServerMessage::PlayerSkill {
                player_id,
                skill_id,
            } => {
                self.push_event(SessionEvent::PeerSkill {
                    player_id,
                    skill_id,
                });
            }
            ServerMessage::PlayerCollectItem { player_id, item_id } => {
                self.push_event(SessionEvent::ItemCollected { player_id, item_id });
            }
            ServerMessage::PlayerDamaged {
                player_id,
                amount,
                source,
            } => {
                self.push_event(SessionEvent::PlayerDamaged {
                    player_id,
                    amount,
                    source,
                });
            }
            ServerMessage::PlayerDied { player_id } => {
                self.push_event(SessionEvent::PlayerDied { player_id });
            }
            ServerMessage::PlayerRespawn { player_id, x, y } => {
                self.push_event(SessionEvent::PlayerRespawned { player_id, x, y });
            }
            ServerMessage::ChatMessage {
                from,
                message,
                channel,
            } => {
                self.push_event(SessionEvent::Chat {
                    from,
                    message,
                    channel,
                });
            }
            ServerMessage::ChatWhisper { from, message } => {
                self.push_event(SessionEvent::Whisper { from, message });
            }
            ServerMessage::Error { message } => {
                self.push_event(SessionEvent::ServerError { message });
            }
            ServerMessage::Warning { message } => {
                self.push_event(SessionEvent::ServerWarning { message });
            }
            ServerMessage::Pong { nonce } => self.handle_pong(nonce),
            ServerMessage::Disconnect { reason } => {
                self.state = ConnectionState::Disconnected;
                self.reset_session_state();
                self.push_event(SessionEvent::Disconnected { reason });
            }
        }
    }

    fn handle_pong(&mut self, nonce: u64) {
        match self.pending_ping {
            Some(pending) if pending.nonce == nonce => {
                let rtt_ms = pending.sent_at.elapsed().as_millis();
                self.stats.ping = rtt_ms;
                self.pending_ping = None;
                self.push_event(SessionEvent::PongReceived { rtt_ms });
            }
            _ => trace!("ignoring stale pong (nonce {nonce})"),
        }
    }

    fn advance_timers(&mut self) {
        let now = Instant::now();
        match self.state {
            ConnectionState::Connecting => self.advance_connect(now),
            ConnectionState::Connected => self.advance_liveness(now),
            ConnectionState::Disconnected => {}
        }
    }

    fn advance_connect(&mut self, now: Instant) {
        let Some(mut attempt) = self.connect_attempt else {
            // state says Connecting but no attempt is tracked; recover by
            // dropping back to Disconnected
            warn!("connecting without an active attempt record");
            self.state = ConnectionState::Disconnected;
            return;
        };

        if now.duration_since(attempt.started) >= self.config.connect_timeout {
            self.fail_connect(attempt.attempts);
            return;
        }

        if now.duration_since(attempt.last_request) < self.config.reconnection_delay {
            return;
        }

        if attempt.attempts < self.config.reconnection_attempts {
            attempt.attempts += 1;
            attempt.last_request = now;
            self.connect_attempt = Some(attempt);
            self.push_event(SessionEvent::ReconnectAttempt {
                attempt: attempt.attempts,
            });
            self.send_connect_request();
        } else {
            // final attempt has gone unanswered for a full retry interval
            self.fail_connect(attempt.attempts);
        }
    }

    fn fail_connect(&mut self, attempts: u32) {
        self.state = ConnectionState::Disconnected;
        self.reset_session_state();
        self.push_event(SessionEvent::ConnectFailed { attempts });
    }

    fn advance_liveness(&mut self, now: Instant) {
        if let Some(pending) = self.pending_ping {
            let elapsed = now.duration_since(pending.sent_at);
            if elapsed >= self.config.ping_timeout {
                self.pending_ping = None;
                if !self.interrupted {
                    self.interrupted = true;
                    self.push_event(SessionEvent::NetworkInterrupted {
                        elapsed_ms: elapsed.as_millis(),
                    });
                }
            }
            return;
        }

        let ping_due = match self.last_ping_sent {
            None => true,
            Some(sent) => now.duration_since(sent) >= self.config.ping_interval,
        };
        if ping_due {
            self.start_ping(now);
        }
    }

    fn start_ping(&mut self, now: Instant) {
        if self.pending_ping.is_some() {
            trace!("ping already outstanding, not sending another");
            return;
        }
        let nonce = self.next_ping_nonce;
        self.next_ping_nonce += 1;
        self.pending_ping = Some(PendingPing {
            nonce,
            sent_at: now,
        });
        self.last_ping_sent = Some(now);
        self.send_packet(ClientMessage::Ping { nonce });
    }
}
