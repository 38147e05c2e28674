//! In-memory transport pair for tests, examples, and single-process demos.
//!
//! [`loopback_pair`] yields a [`LoopbackTransport`] (the client side, which
//! plugs into a [`NetworkSession`]) and a [`LoopbackServer`] handle that a test
//! or demo server loop uses to inspect client traffic and inject server
//! packets. Delivery is perfect and ordered - use it to exercise session logic,
//! not network failure modes.
//!
//! [`NetworkSession`]: crate::NetworkSession

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::network::messages::{ClientPacket, ServerMessage, ServerPacket};
use crate::Transport;

type SharedQueue<T> = Arc<Mutex<VecDeque<T>>>;

/// The client end of an in-memory transport pair. Implements [`Transport`].
#[derive(Debug)]
pub struct LoopbackTransport {
    to_server: SharedQueue<ClientPacket>,
    from_server: SharedQueue<ServerPacket>,
}

/// The server end of an in-memory transport pair.
///
/// Cloning is cheap; clones share the same queues.
#[derive(Debug, Clone)]
pub struct LoopbackServer {
    from_client: SharedQueue<ClientPacket>,
    to_client: SharedQueue<ServerPacket>,
}

/// Creates a connected client/server transport pair.
#[must_use]
pub fn loopback_pair() -> (LoopbackTransport, LoopbackServer) {
    let client_to_server: SharedQueue<ClientPacket> = Arc::new(Mutex::new(VecDeque::new()));
    let server_to_client: SharedQueue<ServerPacket> = Arc::new(Mutex::new(VecDeque::new()));
    (
        LoopbackTransport {
            to_server: client_to_server.clone(),
            from_server: server_to_client.clone(),
        },
        LoopbackServer {
            from_client: client_to_server,
            to_client: server_to_client,
        },
    )
}

impl Transport for LoopbackTransport {
    fn send(&mut self, packet: &ClientPacket) {
        self.to_server.lock().push_back(packet.clone());
    }

    fn receive_all_messages(&mut self) -> Vec<ServerPacket> {
        self.from_server.lock().drain(..).collect()
    }
}

impl LoopbackServer {
    /// Queues a raw packet for delivery to the client.
    pub fn push_packet(&self, packet: ServerPacket) {
        self.to_client.lock().push_back(packet);
    }

    /// Queues a message body for delivery to the client, wrapped in a header
    /// with the current protocol version.
    pub fn push(&self, body: ServerMessage) {
        self.push_packet(ServerPacket::new(body));
    }

    /// Returns all packets the client has sent since the last call.
    #[must_use]
    pub fn drain_client_packets(&self) -> Vec<ClientPacket> {
        self.from_client.lock().drain(..).collect()
    }

    /// Number of client packets waiting to be drained.
    #[must_use]
    pub fn pending_client_packets(&self) -> usize {
        self.from_client.lock().len()
    }
}
