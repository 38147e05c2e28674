use std::sync::Once;

use driftline::{
    loopback_pair, LoopbackServer, LoopbackTransport, NetworkSession, PlayerId, ServerMessage,
    SessionBuilder, SessionConfig, SessionEvent,
};

static TRACING: Once = Once::new();

/// Installs a test-writer tracing subscriber once per process, so session
/// trace output lands in the captured test output.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Builds a disconnected session wired to a loopback server handle.
#[allow(dead_code)]
#[must_use]
pub fn loopback_session(
    config: SessionConfig,
) -> (NetworkSession<LoopbackTransport>, LoopbackServer) {
    init_tracing();
    let (transport, server) = loopback_pair();
    let session = SessionBuilder::new()
        .with_config(config)
        .start_session(transport)
        .expect("config should be valid");
    (session, server)
}

/// Builds a session and walks it through a successful handshake, returning it
/// in the connected state with the handshake events already drained.
#[allow(dead_code)]
#[must_use]
pub fn connected_session(
    config: SessionConfig,
    player_id: &str,
) -> (NetworkSession<LoopbackTransport>, LoopbackServer) {
    let (mut session, server) = loopback_session(config);
    session.connect().expect("connect from fresh session");
    server.push(ServerMessage::ConnectionAck {
        player_id: PlayerId::new(player_id),
    });
    session.poll();

    let events: Vec<_> = session.events().collect();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::Connected { .. })),
        "handshake should produce a Connected event, got {events:?}"
    );
    // the connect request and the first liveness ping
    server.drain_client_packets();
    (session, server)
}
