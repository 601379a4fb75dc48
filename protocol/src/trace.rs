use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in nanoseconds since the Unix epoch.
///
/// The trace spans three hosts, so the checkpoints use the wall clock
/// rather than a process-local monotonic clock. Ordering violations are
/// therefore possible and are reported as skew, never silently dropped.
pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// The six checkpoints of one provisioning exchange, in protocol order:
/// client send, server receive, generator start, generator end, server
/// send, client receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampTrace {
    /// t1.1: client sends the trigger request
    pub client_send: u64,
    /// t2.1: server receives the request
    pub server_recv: u64,
    /// t3.1: generator invocation starts
    pub generator_start: u64,
    /// t3.2: generator invocation ends
    pub generator_end: u64,
    /// t2.2: server writes the response
    pub server_send: u64,
    /// t1.2: client receives the response
    pub client_recv: u64,
}

impl TimestampTrace {
    /// Assemble a complete trace from the client-side pair and the four
    /// optional server-reported points. Returns `None` when any server
    /// point is absent (older servers omit them).
    pub fn from_parts(
        client_send: u64,
        server_recv: Option<u64>,
        generator_start: Option<u64>,
        generator_end: Option<u64>,
        server_send: Option<u64>,
        client_recv: u64,
    ) -> Option<Self> {
        Some(Self {
            client_send,
            server_recv: server_recv?,
            generator_start: generator_start?,
            generator_end: generator_end?,
            server_send: server_send?,
            client_recv,
        })
    }

    fn points(&self) -> [(&'static str, u64); 6] {
        [
            ("t1.1", self.client_send),
            ("t2.1", self.server_recv),
            ("t3.1", self.generator_start),
            ("t3.2", self.generator_end),
            ("t2.2", self.server_send),
            ("t1.2", self.client_recv),
        ]
    }

    /// Every adjacent checkpoint pair that breaks the expected ordering
    /// `t1.1 ≤ t2.1 ≤ t3.1 ≤ t3.2 ≤ t2.2 ≤ t1.2`. Non-empty output means
    /// clock skew across hosts.
    pub fn violations(&self) -> Vec<(&'static str, &'static str)> {
        self.points()
            .windows(2)
            .filter(|w| w[0].1 > w[1].1)
            .map(|w| (w[0].0, w[1].0))
            .collect()
    }

    /// Total round-trip time observed by the client, `t1.2 − t1.1`.
    pub fn total_ns(&self) -> u64 {
        self.client_recv.saturating_sub(self.client_send)
    }

    /// Generator invocation time, `t3.2 − t3.1`.
    pub fn generator_ns(&self) -> u64 {
        self.generator_end.saturating_sub(self.generator_start)
    }
}
