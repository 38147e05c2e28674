//! Wire packet definitions exchanged with the game server.
//!
//! Packets are binary (bincode) and asymmetric: the client sends
//! [`ClientPacket`]s and receives [`ServerPacket`]s. Both carry a versioned
//! [`PacketHeader`]; a packet whose version does not match
//! [`PROTOCOL_VERSION`] is dropped by the session.

use serde::{Deserialize, Serialize};

use crate::{PlayerId, RoomId, Sequence};

/// The wire protocol version stamped into every packet header.
pub const PROTOCOL_VERSION: u16 = 1;

/// Header prepended to every wire packet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketHeader {
    /// Protocol version of the sender. Mismatched packets are dropped.
    pub version: u16,
}

impl Default for PacketHeader {
    fn default() -> Self {
        Self {
            version: PROTOCOL_VERSION,
        }
    }
}

/// Movement and action flags captured for a single input command.
///
/// The payload is owned by gameplay code; this core only transports and
/// records it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFlags {
    /// Move left.
    pub left: bool,
    /// Move right.
    pub right: bool,
    /// Move / aim up.
    pub up: bool,
    /// Move / aim down.
    pub down: bool,
    /// Jump pressed.
    pub jump: bool,
    /// Skill activated this command, if any.
    pub skill: Option<u32>,
}

/// One locally-applied input command as transmitted to the server.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerInputPayload {
    /// Monotonic sequence number assigned by the input-producing side.
    pub sequence: Sequence,
    /// The captured movement/action flags.
    pub input: InputFlags,
    /// Client-local wall-clock capture time, milliseconds since UNIX_EPOCH.
    /// Zero when the local clock was unusable.
    pub timestamp_ms: u64,
}

impl Default for PlayerInputPayload {
    fn default() -> Self {
        Self {
            sequence: Sequence::NULL,
            input: InputFlags::default(),
            timestamp_ms: 0,
        }
    }
}

/// Parameters for a matchmaking request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchmakingRequest {
    /// Requested game mode, e.g. `"classic"`.
    pub game_mode: String,
    /// Preferred region, if the caller has one.
    pub region: Option<String>,
    /// Desired room size, if the caller wants to constrain it.
    pub max_players: Option<u8>,
    /// Self-reported skill level for bracket matching.
    pub skill_level: Option<u32>,
}

/// The channel a chat message is addressed to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatChannel {
    /// Everyone in the current room.
    #[default]
    Room,
    /// Everyone on the server.
    Global,
    /// A single player; requires a target player id.
    Whisper,
}

/// An outbound chat message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessagePayload {
    /// The message text.
    pub message: String,
    /// The addressed channel.
    pub channel: ChatChannel,
    /// Target player for [`ChatChannel::Whisper`]; ignored otherwise.
    pub target_player_id: Option<PlayerId>,
}

/// Description of a room as reported by the server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    /// The room identifier.
    pub room_id: RoomId,
    /// Maximum number of players the room holds.
    pub max_players: u8,
    /// Players currently in the room.
    pub players: Vec<PlayerId>,
}

/// Authoritative per-player state within a [`GameStateUpdate`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// The player this snapshot describes.
    pub player_id: PlayerId,
    /// Authoritative x position.
    pub x: f32,
    /// Authoritative y position.
    pub y: f32,
    /// Authoritative x velocity.
    pub vx: f32,
    /// Authoritative y velocity.
    pub vy: f32,
    /// Authoritative health value.
    pub health: i32,
}

/// An authoritative state snapshot broadcast by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameStateUpdate {
    /// Server simulation tick this snapshot was taken at.
    pub tick: u64,
    /// The highest local input sequence the server had processed when it took
    /// this snapshot. [`Sequence::NULL`] when no input has been processed yet.
    pub last_processed_input: Sequence,
    /// Per-player authoritative state.
    pub players: Vec<PlayerSnapshot>,
}

impl Default for GameStateUpdate {
    fn default() -> Self {
        Self {
            tick: 0,
            last_processed_input: Sequence::NULL,
            players: Vec::new(),
        }
    }
}

/// Message bodies sent from the client to the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Open a session, optionally presenting an auth token.
    Connect {
        /// Auth token attached at connect time, if any.
        auth_token: Option<String>,
    },
    /// Close the session deliberately.
    Disconnect,
    /// Enter the matchmaking queue.
    MatchmakingRequest(MatchmakingRequest),
    /// Leave the matchmaking queue.
    MatchmakingCancel,
    /// Join an existing room.
    JoinRoom {
        /// The room to join.
        room_id: RoomId,
    },
    /// Leave a room.
    LeaveRoom {
        /// The room to leave.
        room_id: RoomId,
    },
    /// Transmit one locally-applied input command.
    PlayerInput(PlayerInputPayload),
    /// The local player jumped.
    PlayerJump,
    /// The local player used a skill.
    PlayerSkill {
        /// Identifier of the used skill.
        skill_id: u32,
    },
    /// The local player collected an item.
    PlayerCollectItem {
        /// Identifier of the collected item.
        item_id: u64,
    },
    /// Send a chat message.
    ChatMessage(ChatMessagePayload),
    /// Liveness probe; the server answers with [`ServerMessage::Pong`].
    Ping {
        /// Opaque value echoed back in the pong.
        nonce: u64,
    },
}

/// Message bodies sent from the server to the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// The handshake succeeded; the session is connected.
    ConnectionAck {
        /// The player identifier assigned to this client.
        player_id: PlayerId,
    },
    /// The local player joined a room.
    RoomJoined(RoomInfo),
    /// A room was created with the local player as a member.
    RoomCreated(RoomInfo),
    /// The current room was paused.
    RoomPaused,
    /// The current room was resumed.
    RoomResumed,
    /// The current room ended.
    RoomEnded {
        /// Optional reason the room ended.
        reason: Option<String>,
    },
    /// Another player joined the current room.
    PlayerJoinedRoom {
        /// The joining player.
        player_id: PlayerId,
    },
    /// Another player left the current room.
    PlayerLeftRoom {
        /// The leaving player.
        player_id: PlayerId,
    },
    /// Authoritative state snapshot.
    GameStateUpdate(GameStateUpdate),
    /// Another player's raw input, replicated by the server.
    PlayerInput {
        /// The originating player.
        player_id: PlayerId,
        /// The replicated input command.
        payload: PlayerInputPayload,
    },
    /// Another player jumped.
    PlayerJump {
        /// The jumping player.
        player_id: PlayerId,
    },
    /// Another player used a skill.
    PlayerSkill {
        /// The player using the skill.
        player_id: PlayerId,
        /// Identifier of the used skill.
        skill_id: u32,
    },
    /// A player collected an item.
    PlayerCollectItem {
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
    PlayerRespawn {
        /// The respawning player.
        player_id: PlayerId,
        /// Respawn x position.
        x: f32,
        /// Respawn y position.
        y: f32,
    },
    /// A chat message on a public channel.
    ChatMessage {
        /// The sending player.
        from: PlayerId,
        /// The message text.
        message: String,
        /// The channel the message was sent on.
        channel: ChatChannel,
    },
    /// A private chat message.
    ChatWhisper {
        /// The sending player.
        from: PlayerId,
        /// The message text.
        message: String,
    },
    /// Server-reported error.
    Error {
        /// Error description.
        message: String,
    },
    /// Server-reported warning.
    Warning {
        /// Warning description.
        message: String,
    },
    /// Answer to a [`ClientMessage::Ping`].
    Pong {
        /// The nonce from the originating ping.
        nonce: u64,
    },
    /// The server is closing this session.
    Disconnect {
        /// Reason for the disconnect.
        reason: String,
    },
}

/// A packet that a [`Transport`] sends to the server. When implementing
/// [`Transport`], serialize this type with [`codec`] and transmit the bytes.
///
/// [`Transport`]: crate::Transport
/// [`codec`]: crate::network::codec
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientPacket {
    /// The versioned packet header.
    pub header: PacketHeader,
    /// The message body.
    pub body: ClientMessage,
}

impl ClientPacket {
    /// Wraps a message body in a packet with the current protocol version.
    #[must_use]
    pub fn new(body: ClientMessage) -> Self {
        Self {
            header: PacketHeader::default(),
            body,
        }
    }
}

/// A packet that a [`Transport`] receives from the server.
///
/// [`Transport`]: crate::Transport
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerPacket {
    /// The versioned packet header.
    pub header: PacketHeader,
    /// The message body.
    pub body: ServerMessage,
}

impl ServerPacket {
    /// Wraps a message body in a packet with the current protocol version.
    #[must_use]
    pub fn new(body: ServerMessage) -> Self {
        Self {
            header: PacketHeader::default(),
            body,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::network::codec;

    #[test]
    fn packet_header_default_carries_current_version() {
        let header = PacketHeader::default();
        assert_eq!(header.version, PROTOCOL_VERSION);
    }

    #[test]
    fn input_flags_default_is_neutral() {
        let flags = InputFlags::default();
        assert!(!flags.left);
        assert!(!flags.right);
        assert!(!flags.up);
        assert!(!flags.down);
        assert!(!flags.jump);
        assert!(flags.skill.is_none());
    }

    #[test]
    fn player_input_payload_default() {
        let payload = PlayerInputPayload::default();
        assert_eq!(payload.sequence, Sequence::NULL);
        assert_eq!(payload.timestamp_ms, 0);
    }

    #[test]
    fn game_state_update_default_has_null_ack() {
        let update = GameStateUpdate::default();
        assert_eq!(update.tick, 0);
        assert!(update.last_processed_input.is_null());
        assert!(update.players.is_empty());
    }

    #[test]
    fn chat_channel_default_is_room() {
        assert_eq!(ChatChannel::default(), ChatChannel::Room);
    }

    #[test]
    fn client_packet_roundtrip() {
        let packet = ClientPacket::new(ClientMessage::PlayerInput(PlayerInputPayload {
            sequence: Sequence::new(17),
            input: InputFlags {
                left: true,
                jump: true,
                ..InputFlags::default()
            },
            timestamp_ms: 1_700_000_000_000,
        }));
        let bytes = codec::encode(&packet).unwrap();
        let (decoded, consumed): (ClientPacket, _) = codec::decode(&bytes).unwrap();
        assert_eq!(packet, decoded);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn server_packet_roundtrip() {
        let packet = ServerPacket::new(ServerMessage::GameStateUpdate(GameStateUpdate {
            tick: 240,
            last_processed_input: Sequence::new(3),
            players: vec![PlayerSnapshot {
                player_id: PlayerId::new("p1"),
                x: 4.0,
                y: -2.5,
                vx: 0.0,
                vy: 9.81,
                health: 80,
            }],
        }));
        let bytes = codec::encode(&packet).unwrap();
        let decoded: ServerPacket = codec::decode_value(&bytes).unwrap();
        assert_eq!(packet, decoded);
    }

    #[test]
    fn matchmaking_request_roundtrip() {
        let request = MatchmakingRequest {
            game_mode: "classic".to_owned(),
            region: Some("eu-west".to_owned()),
            max_players: Some(4),
            skill_level: None,
        };
        let packet = ClientPacket::new(ClientMessage::MatchmakingRequest(request.clone()));
        let bytes = codec::encode(&packet).unwrap();
        let decoded: ClientPacket = codec::decode_value(&bytes).unwrap();
        assert_eq!(
            decoded.body,
            ClientMessage::MatchmakingRequest(request)
        );
    }

    #[test]
    fn encoding_is_deterministic() {
        let packet = ClientPacket::new(ClientMessage::Ping { nonce: 99 });
        let bytes1 = codec::encode(&packet).unwrap();
        let bytes2 = codec::encode(&packet).unwrap();
        assert_eq!(bytes1, bytes2);
    }
}
