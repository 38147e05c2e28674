/// The `SessionStats` struct contains statistics about the current session.
///
/// Round-trip time is measured by the session's ping/pong exchange and updated
/// each time a pong arrives; the counters track wire packets observed by the
/// session (not datagrams - a transport may batch differently).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "SessionStats should be inspected or used after being queried"]
pub struct SessionStats {
    /// The most recently measured round-trip time in milliseconds, as
    /// calculated from the ping/pong exchange. Zero until the first pong.
    pub ping: u128,
    /// Total packets sent over the session's lifetime, including connect
    /// retries and pings.
    pub packets_sent: usize,
    /// Total recognized packets received over the session's lifetime.
    pub packets_received: usize,
}

impl SessionStats {
    /// Creates a new `SessionStats` instance with default values.
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Display for SessionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Destructure to ensure all fields are included when new fields are added.
        let Self {
            ping,
            packets_sent,
            packets_received,
        } = self;

        write!(
            f,
            "SessionStats {{ ping: {}ms, sent: {}, received: {} }}",
            ping, packets_sent, packets_received
        )
    }
}
