//! # Driftline
//!
//! Driftline is a client-side prediction and server-session networking library
//! written in 100% safe Rust. It pairs a typed session layer over an unreliable
//! transport with a bounded input-history reconciler, so a game client can apply
//! local inputs immediately and correct itself when authoritative server state
//! arrives.
//!
//! The library is poll-driven: instead of registering callbacks, you call
//! [`NetworkSession::poll`] once per game tick and drain typed [`SessionEvent`]s
//! from the session. There is no global event bus - each session owns its own
//! bounded event queue.
//!
//! ## The two cooperating pieces
//!
//! - [`NetworkSession`] owns a single [`Transport`] connection to a game server,
//!   translates inbound wire messages into [`SessionEvent`]s, and exposes a
//!   fixed catalogue of fire-and-forget outbound actions (matchmaking, rooms,
//!   player input, chat).
//! - [`PredictionReconciler`] records locally-applied inputs tagged with
//!   monotonic [`Sequence`] numbers and, on receipt of authoritative state,
//!   discards acknowledged entries and delegates correction to caller-supplied
//!   logic.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use error::DriftlineError;
pub use network::loopback::{loopback_pair, LoopbackServer, LoopbackTransport};
pub use network::messages::{
    ChatChannel, ChatMessagePayload, ClientMessage, ClientPacket, GameStateUpdate, InputFlags,
    MatchmakingRequest, PacketHeader, PlayerInputPayload, PlayerSnapshot, RoomInfo, ServerMessage,
    ServerPacket, PROTOCOL_VERSION,
};
pub use network::session_stats::SessionStats;
pub use network::udp_socket::UdpClientSocket;
pub use prediction::{AuthoritativeState, InputRecord, PredictionConfig, PredictionReconciler};
pub use sessions::builder::SessionBuilder;
pub use sessions::config::SessionConfig;
pub use sessions::event_drain::EventDrain;
pub use sessions::network_session::NetworkSession;

mod clock;
#[doc(hidden)]
pub mod error;
#[doc(hidden)]
pub mod prediction;
#[doc(hidden)]
pub mod sessions {
    #[doc(hidden)]
    pub mod builder;
    #[doc(hidden)]
    pub mod config;
    #[doc(hidden)]
    pub mod event_drain;
    #[doc(hidden)]
    pub mod network_session;
}
#[doc(hidden)]
pub mod network {
    /// Binary codec for wire packet serialization.
    ///
    /// Provides centralized encoding and decoding of wire packets using bincode.
    pub mod codec;
    #[doc(hidden)]
    pub mod loopback;
    #[doc(hidden)]
    pub mod messages;
    #[doc(hidden)]
    pub mod session_stats;
    #[doc(hidden)]
    pub mod udp_socket;
}

// #############
// # CONSTANTS #
// #############

/// Internally, -1 represents "no sequence" / nothing acknowledged yet.
pub const NULL_SEQUENCE: i64 = -1;

/// A monotonic identifier attached to each locally-applied input command.
///
/// Sequence numbers order inputs and let the server acknowledge how far it has
/// processed a client's input stream. They are assigned by the input-producing
/// side and are expected to be strictly increasing per session; the library
/// does not enforce this (caller responsibility).
///
/// The special value [`NULL_SEQUENCE`] (-1) represents "no sequence", used for
/// server states that have not yet processed any input.
///
/// # Examples
///
/// ```
/// use driftline::Sequence;
///
/// let seq = Sequence::new(0);
/// assert!(seq.is_valid());
/// assert!(Sequence::NULL.is_null());
///
/// let next = seq.next();
/// assert_eq!(next.as_i64(), 1);
/// assert!(next > seq);
/// ```
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Sequence(i64);

impl Sequence {
    /// The null sequence constant, representing "nothing acknowledged".
    ///
    /// This is equivalent to [`NULL_SEQUENCE`] (-1).
    pub const NULL: Sequence = Sequence(NULL_SEQUENCE);

    /// Creates a new `Sequence` from an `i64` value.
    ///
    /// Note: this does not validate the value. Use [`Sequence::is_valid()`] to
    /// check whether it represents an actual (non-negative) sequence number.
    #[inline]
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Sequence(value)
    }

    /// Returns the underlying `i64` value.
    #[inline]
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Returns `true` if this is the null sequence (equivalent to [`NULL_SEQUENCE`]).
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == NULL_SEQUENCE
    }

    /// Returns `true` if this sequence is valid (non-negative).
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }

    /// Returns the next sequence number.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Sequence {
        Sequence(self.0 + 1)
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "NULL_SEQUENCE")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl std::ops::Add<i64> for Sequence {
    type Output = Sequence;

    #[inline]
    fn add(self, rhs: i64) -> Self::Output {
        Sequence(self.0 + rhs)
    }
}

impl std::ops::AddAssign<i64> for Sequence {
    #[inline]
    fn add_assign(&mut self, rhs: i64) {
        self.0 += rhs;
    }
}

impl std::ops::Sub<Sequence> for Sequence {
    type Output = i64;

    #[inline]
    fn sub(self, rhs: Sequence) -> Self::Output {
        self.0 - rhs.0
    }
}

impl From<i64> for Sequence {
    #[inline]
    fn from(value: i64) -> Self {
        Sequence(value)
    }
}

impl From<Sequence> for i64 {
    #[inline]
    fn from(seq: Sequence) -> Self {
        seq.0
    }
}

impl PartialEq<i64> for Sequence {
    #[inline]
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<i64> for Sequence {
    #[inline]
    fn partial_cmp(&self, other: &i64) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

/// A unique identifier for a player, assigned by the server on handshake.
///
/// # Examples
///
/// ```
/// use driftline::PlayerId;
///
/// let id = PlayerId::new("p-42");
/// assert_eq!(id.as_str(), "p-42");
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub struct PlayerId(String);

impl PlayerId {
    /// Creates a new `PlayerId` from anything string-like.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        PlayerId(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    #[inline]
    fn from(value: &str) -> Self {
        PlayerId(value.to_owned())
    }
}

impl From<String> for PlayerId {
    #[inline]
    fn from(value: String) -> Self {
        PlayerId(value)
    }
}

/// A unique identifier for a room - a server-side grouping of players
/// participating in one game session.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub struct RoomId(String);

impl RoomId {
    /// Creates a new `RoomId` from anything string-like.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        RoomId(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    #[inline]
    fn from(value: &str) -> Self {
        RoomId(value.to_owned())
    }
}

impl From<String> for RoomId {
    #[inline]
    fn from(value: String) -> Self {
        RoomId(value)
    }
}

// #############
// #   ENUMS   #
// #############

/// A session is always in one of these states. Query it via [`current_state`].
///
/// [`current_state`]: NetworkSession#method.current_state
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport-level session is established.
    #[default]
    Disconnected,
    /// A connect request has been sent; the session is retrying until the
    /// server acknowledges or the attempt budget / timeout is exhausted.
    Connecting,
    /// The server has acknowledged the handshake and assigned a player id.
    Connected,
}

/// Notifications that you can receive from the session. Handling them is up to
/// the user.
///
/// Every recognized inbound server message is re-emitted as one of these
/// variants; a small subset additionally mutate session state before emission
/// (connection ack, room joined/created/ended, disconnect).
///
/// # Forward Compatibility
///
/// This enum is marked `#[non_exhaustive]` because new event types may be
/// added in future versions. Always include a wildcard arm when matching.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SessionEvent {
    /// The server acknowledged the handshake. The session is now connected.
    Connected {
        /// The player identifier assigned by the server.
        player_id: PlayerId,
    },
    /// The connect attempt budget or the connect timeout was exhausted without
    /// a server acknowledgment. The session is back in
    /// [`ConnectionState::Disconnected`].
    ConnectFailed {
        /// Total connect requests sent before giving up.
        attempts: u32,
    },
    /// A connect request is being retried.
    ReconnectAttempt {
        /// 1-based number of this attempt.
        attempt: u32,
    },
    /// The server ended the session. All session state has been cleared.
    Disconnected {
        /// Server-supplied reason string.
        reason: String,
    },
    /// No pong has arrived within the configured ping timeout. Sent at most
    /// once per interruption; [`SessionEvent::NetworkResumed`] follows if
    /// traffic recovers.
    NetworkInterrupted {
        /// Milliseconds since the unanswered ping was sent.
        elapsed_ms: u128,
    },
    /// Sent only after a [`SessionEvent::NetworkInterrupted`] event, once
    /// server traffic has resumed.
    NetworkResumed,
    /// The local player joined a room.
    RoomJoined {
        /// Description of the joined room.
        room: RoomInfo,
    },
    /// A room was created with the local player as a member.
    RoomCreated {
        /// Description of the created room.
        room: RoomInfo,
    },
    /// The current room was paused.
    RoomPaused,
    /// The current room was resumed.
    RoomResumed,
    /// The current room ended. The session's room id has been cleared.
    RoomEnded {
        /// Optional server-supplied reason.
        reason: Option<String>,
    },
    /// Another player joined the current room.
    PlayerJoined {
        /// The joining player.
        player_id: PlayerId,
    },
    /// Another player left the current room.
    PlayerLeft {
        /// The leaving player.
        player_id: PlayerId,
    },
    /// An authoritative state snapshot arrived. Feed this to
    /// [`PredictionReconciler::reconcile`].
    StateUpdate {
        /// The authoritative snapshot.
        update: GameStateUpdate,
    },
    /// A remote player's raw input was replicated to this client.
    PeerInput {
        /// The originating player.
        player_id: PlayerId,
        /// The replicated input command.
        payload: PlayerInputPayload,
    },
    /// A remote player jumped.
    PeerJump {
        /// The originating player.
        player_id: PlayerId,
    },
    /// A remote player used a skill.
    PeerSkill {
        /// The originating player.
        player_id: PlayerId,
        /// Identifier of the used skill.
        skill_id: u32,
    },
    /// A player collected an item.
    ItemCollected {
        /// The collecting player.
        player_id: PlayerId,
        /// Identifier of the collected item.
        item_id: u64,
    },
    /// A player took damage.
    PlayerDamaged {
        /// The damaged player.
        player_id: PlayerId,
        /// Damage amount.
        amount: u32,
        /// The damage source, if attributable to a player.
        source: Option<PlayerId>,
    },
    /// A player died.
    PlayerDied {
        /// The dead player.
        player_id: PlayerId,
    },
    /// A player respawned.
    PlayerRespawned {
        /// The respawning player.
        player_id: PlayerId,
        /// Respawn x position.
        x: f32,
        /// Respawn y position.
        y: f32,
    },
    /// A chat message was received.
    Chat {
        /// The sending player.
        from: PlayerId,
        /// The message text.
        message: String,
        /// The channel the message was sent on.
        channel: ChatChannel,
    },
    /// A private chat message was received.
    Whisper {
        /// The sending player.
        from: PlayerId,
        /// The message text.
        message: String,
    },
    /// The server reported an error. Informational - the session stays up
    /// unless a disconnect follows.
    ServerError {
        /// Server-supplied error description.
        message: String,
    },
    /// The server reported a warning.
    ServerWarning {
        /// Server-supplied warning description.
        message: String,
    },
    /// A pong arrived for an outstanding ping. The measured round-trip time is
    /// also recorded in [`SessionStats`].
    PongReceived {
        /// Measured round-trip time in milliseconds.
        rtt_ms: u128,
    },
}

// #############
// #  TRAITS   #
// #############

/// The [`Transport`] trait is the seam between the session and the network.
/// However you wish to send and receive packets, implement it through these two
/// methods. Packets should be sent in a UDP-like fashion, unordered and
/// unreliable; the session's contract assumes best-effort delivery only.
pub trait Transport {
    /// Takes a [`ClientPacket`] and sends it to the server. Fire-and-forget:
    /// implementations log failures instead of returning them.
    fn send(&mut self, packet: &ClientPacket);

    /// Returns all packets received from the server since the last time this
    /// method was called. Must not block.
    fn receive_all_messages(&mut self) -> Vec<ServerPacket>;
}

// ###################
// # UNIT TESTS      #
// ###################

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    // ==========================================
    // Sequence Tests
    // ==========================================

    #[test]
    fn sequence_null_constant() {
        assert_eq!(Sequence::NULL.as_i64(), -1);
        assert!(Sequence::NULL.is_null());
        assert!(!Sequence::NULL.is_valid());
    }

    #[test]
    fn sequence_new() {
        let seq = Sequence::new(0);
        assert_eq!(seq.as_i64(), 0);
        assert!(!seq.is_null());
        assert!(seq.is_valid());
    }

    #[test]
    fn sequence_next() {
        assert_eq!(Sequence::new(4).next(), Sequence::new(5));
        // NULL.next() is the first real sequence
        assert_eq!(Sequence::NULL.next(), Sequence::new(0));
    }

    #[test]
    fn sequence_arithmetic() {
        let seq = Sequence::new(10);
        assert_eq!((seq + 5).as_i64(), 15);
        assert_eq!(Sequence::new(10) - Sequence::new(4), 6);

        let mut seq = Sequence::new(1);
        seq += 2;
        assert_eq!(seq.as_i64(), 3);
    }

    #[test]
    fn sequence_comparison() {
        assert!(Sequence::new(1) < Sequence::new(2));
        assert!(Sequence::NULL < Sequence::new(0));
        assert!(Sequence::new(3) > 2);
        assert_eq!(Sequence::new(7), 7);
    }

    #[test]
    fn sequence_display() {
        assert_eq!(format!("{}", Sequence::new(42)), "42");
        assert_eq!(format!("{}", Sequence::NULL), "NULL_SEQUENCE");
    }

    #[test]
    fn sequence_conversions() {
        let seq: Sequence = 9i64.into();
        assert_eq!(seq.as_i64(), 9);
        let raw: i64 = seq.into();
        assert_eq!(raw, 9);
    }

    // ==========================================
    // PlayerId / RoomId Tests
    // ==========================================

    #[test]
    fn player_id_roundtrip() {
        let id = PlayerId::new("abc");
        assert_eq!(id.as_str(), "abc");
        assert_eq!(format!("{}", id), "abc");
        assert_eq!(PlayerId::from("abc"), id);
        assert_eq!(PlayerId::from("abc".to_owned()), id);
    }

    #[test]
    fn player_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(PlayerId::new("a"));
        set.insert(PlayerId::new("b"));
        set.insert(PlayerId::new("a"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn room_id_roundtrip() {
        let id = RoomId::new("room-1");
        assert_eq!(id.as_str(), "room-1");
        assert_eq!(format!("{}", id), "room-1");
        assert_eq!(RoomId::from("room-1"), id);
    }

    // ==========================================
    // ConnectionState Tests
    // ==========================================

    #[test]
    fn connection_state_default_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn connection_state_equality() {
        assert_eq!(ConnectionState::Connecting, ConnectionState::Connecting);
        assert_ne!(ConnectionState::Connecting, ConnectionState::Connected);
    }

    // ==========================================
    // SessionEvent Tests
    // ==========================================

    #[test]
    fn session_event_connected() {
        let event = SessionEvent::Connected {
            player_id: PlayerId::new("p1"),
        };
        if let SessionEvent::Connected { player_id } = event {
            assert_eq!(player_id.as_str(), "p1");
        } else {
            panic!("Expected Connected event");
        }
    }

    #[test]
    fn session_event_equality() {
        let event1 = SessionEvent::ReconnectAttempt { attempt: 2 };
        let event2 = SessionEvent::ReconnectAttempt { attempt: 2 };
        let event3 = SessionEvent::ReconnectAttempt { attempt: 3 };
        assert_eq!(event1, event2);
        assert_ne!(event1, event3);
    }

    #[test]
    fn session_event_debug_format() {
        let event = SessionEvent::ConnectFailed { attempts: 5 };
        let debug = format!("{:?}", event);
        assert!(debug.contains("ConnectFailed"));
        assert!(debug.contains('5'));
    }
}
