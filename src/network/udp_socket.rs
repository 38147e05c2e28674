use std::{
    io::ErrorKind,
    net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket},
};

use tracing::{error, warn};

use crate::network::codec;
use crate::network::messages::{ClientPacket, ServerPacket};
use crate::Transport;

const RECV_BUFFER_SIZE: usize = 4096;
/// Size of the pre-allocated send buffer. This should be large enough to hold
/// any packet we might send. 1KB is generous for typical session packets.
const SEND_BUFFER_SIZE: usize = 1024;
/// A datagram larger than this may be fragmented, so ideally we wouldn't send
/// packets larger than this.
/// Source: <https://stackoverflow.com/a/35697810/775982>
const IDEAL_MAX_UDP_PACKET_SIZE: usize = 508;

/// A simple non-blocking UDP transport for use with [`NetworkSession`]. Binds
/// an ephemeral local port and connects the socket to the server address, so
/// stray datagrams from other peers are filtered by the OS.
///
/// # Performance
///
/// Maintains internal buffers for both sending and receiving to minimize
/// allocations in the hot path. The send buffer is reused across calls to
/// [`send`], and the receive buffer is sized to handle typical UDP MTU sizes.
///
/// [`NetworkSession`]: crate::NetworkSession
/// [`send`]: Transport::send
#[derive(Debug)]
pub struct UdpClientSocket {
    socket: UdpSocket,
    server_addr: SocketAddr,
    /// Receive buffer - reused across recv calls
    recv_buffer: [u8; RECV_BUFFER_SIZE],
    /// Send buffer - reused across send calls to avoid allocation
    send_buffer: [u8; SEND_BUFFER_SIZE],
}

impl UdpClientSocket {
    /// Binds a UDP socket to an OS-assigned local port, sets it to
    /// non-blocking mode, and connects it to the given server address.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if binding, configuring, or connecting
    /// the socket fails.
    pub fn connect_to(server_addr: SocketAddr) -> Result<Self, std::io::Error> {
        let local = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);
        let socket = UdpSocket::bind(local)?;
        socket.set_nonblocking(true)?;
        socket.connect(server_addr)?;
        Ok(Self {
            socket,
            server_addr,
            recv_buffer: [0; RECV_BUFFER_SIZE],
            send_buffer: [0; SEND_BUFFER_SIZE],
        })
    }

    /// The server address this socket is connected to.
    #[must_use]
    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Sends an already-encoded datagram to the server.
    fn send_encoded_packet(&self, buf: &[u8]) {
        // Overly large datagrams risk fragmentation, which increases effective
        // packet loss (losing any fragment loses the datagram). The occasional
        // large packet is mostly harmless, so this only warns.
        if buf.len() > IDEAL_MAX_UDP_PACKET_SIZE {
            warn!(
                "sending UDP packet of {} bytes, larger than ideal ({})",
                buf.len(),
                IDEAL_MAX_UDP_PACKET_SIZE
            );
        }

        // UDP is best-effort; dropped packets are expected behavior, so a send
        // failure is logged rather than propagated.
        if let Err(e) = self.socket.send(buf) {
            warn!("failed to send UDP packet to {}: {}", self.server_addr, e);
        }
    }
}

impl Transport for UdpClientSocket {
    fn send(&mut self, packet: &ClientPacket) {
        // Serialize into the pre-allocated send buffer to avoid allocation.
        let len = match codec::encode_into(packet, &mut self.send_buffer) {
            Ok(len) => len,
            Err(codec::CodecError::BufferTooSmall { provided }) => {
                warn!(
                    "packet too large for send buffer ({} bytes), falling back to allocation",
                    provided
                );
                match codec::encode(packet) {
                    Ok(buf) => {
                        self.send_encoded_packet(&buf);
                        return;
                    }
                    Err(e) => {
                        error!("failed to serialize packet: {}", e);
                        return;
                    }
                }
            }
            Err(e) => {
                error!("failed to serialize packet: {}", e);
                return;
            }
        };

        let Some(buf_slice) = self.send_buffer.get(..len) else {
            error!(
                "send_buffer slice [..{}] out of bounds (buffer size: {})",
                len, SEND_BUFFER_SIZE
            );
            return;
        };
        self.send_encoded_packet(buf_slice);
    }

    fn receive_all_messages(&mut self) -> Vec<ServerPacket> {
        // Pre-allocate for the typical case of 1-4 packets per poll
        let mut received = Vec::with_capacity(4);
        loop {
            match self.socket.recv(&mut self.recv_buffer) {
                Ok(number_of_bytes) => {
                    let Some(buf_slice) = self.recv_buffer.get(0..number_of_bytes) else {
                        error!(
                            "recv_buffer slice [0..{}] out of bounds (buffer size: {})",
                            number_of_bytes, RECV_BUFFER_SIZE
                        );
                        continue;
                    };
                    match codec::decode_value(buf_slice) {
                        Ok(packet) => received.push(packet),
                        Err(e) => warn!("dropping undecodable server packet: {}", e),
                    }
                }
                // there are no more messages
                Err(ref err) if err.kind() == ErrorKind::WouldBlock => return received,
                // datagram sockets sometimes report this as a delayed result of a send
                Err(ref err) if err.kind() == ErrorKind::ConnectionReset => continue,
                // For other errors, log and stop receiving (don't panic)
                Err(err) => {
                    error!("unexpected socket error: {:?}: {}", err.kind(), err);
                    return received;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::network::messages::{ClientMessage, ServerMessage, ServerPacket};

    fn loopback(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    #[test]
    #[cfg(not(miri))] // Miri cannot execute foreign functions like socket()
    fn udp_socket_connect_to_server_addr() {
        let socket = UdpClientSocket::connect_to(loopback(9000)).unwrap();
        assert_eq!(socket.server_addr(), loopback(9000));
    }

    #[test]
    #[cfg(not(miri))]
    fn udp_socket_is_non_blocking() {
        let mut socket = UdpClientSocket::connect_to(loopback(9001)).unwrap();
        // receive_all_messages should return immediately even with no messages
        let packets = socket.receive_all_messages();
        assert!(packets.is_empty());
    }

    #[test]
    #[cfg(not(miri))]
    fn udp_socket_send_and_receive() {
        // A raw UDP socket plays "server" so we can exercise both directions.
        let server = UdpSocket::bind(loopback(0)).unwrap();
        server.set_nonblocking(true).unwrap();
        let server_addr = loopback(server.local_addr().unwrap().port());

        let mut client = UdpClientSocket::connect_to(server_addr).unwrap();
        client.send(&ClientPacket::new(ClientMessage::Ping { nonce: 7 }));

        // Wait for the datagram with retry (UDP timing varies by platform)
        let mut buf = [0u8; 4096];
        let mut received_len = None;
        for _ in 0..20 {
            match server.recv_from(&mut buf) {
                Ok((len, _)) => {
                    received_len = Some(len);
                    break;
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(50));
                }
                Err(e) => panic!("unexpected server socket error: {e}"),
            }
        }
        let len = received_len.expect("server should receive the ping");
        let decoded: ClientPacket = codec::decode_value(&buf[..len]).unwrap();
        assert_eq!(decoded.body, ClientMessage::Ping { nonce: 7 });

        // And the reverse direction: server -> client
        let reply = ServerPacket::new(ServerMessage::Pong { nonce: 7 });
        let bytes = codec::encode(&reply).unwrap();
        let client_addr = loopback(client.socket.local_addr().unwrap().port());
        server.send_to(&bytes, client_addr).unwrap();

        let mut packets = Vec::new();
        for _ in 0..20 {
            packets = client.receive_all_messages();
            if !packets.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        assert_eq!(packets, vec![reply]);
    }

    #[test]
    fn ideal_max_udp_packet_size_constant() {
        // 508 bytes is the safe payload size to avoid fragmentation
        assert_eq!(IDEAL_MAX_UDP_PACKET_SIZE, 508);
    }

    #[test]
    #[allow(clippy::assertions_on_constants)] // Intentional: verifying constant relationships
    fn buffer_sizes_relationship() {
        assert!(
            SEND_BUFFER_SIZE > IDEAL_MAX_UDP_PACKET_SIZE,
            "SEND_BUFFER_SIZE must exceed IDEAL_MAX_UDP_PACKET_SIZE"
        );
        assert!(
            RECV_BUFFER_SIZE >= SEND_BUFFER_SIZE,
            "RECV_BUFFER_SIZE must be >= SEND_BUFFER_SIZE"
        );
    }
}
