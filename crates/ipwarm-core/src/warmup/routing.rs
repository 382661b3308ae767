//! Quota split between the warm-up pool and default sending

/// How a batch of personalizations is divided for one send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSplit {
    /// Pool-wide cap for the effective day
    pub capacity: u64,
    /// Quota left before this send
    pub remaining: u64,
    /// Leading personalizations that go through the pool
    pub on_pool: usize,
    /// Trailing personalizations that go through default sending
    pub overflow: usize,
}

impl QuotaSplit {
    /// Split `total` personalizations given the day's capacity and what was already sent
    pub fn compute(capacity: u64, already_sent: u64, total: usize) -> Self {
        let remaining = capacity.saturating_sub(already_sent);
        let on_pool = usize::try_from(remaining).map_or(total, |r| r.min(total));

        Self {
            capacity,
            remaining,
            on_pool,
            overflow: total - on_pool,
        }
    }

    /// Whether the pool quota is exhausted once the on-pool part is sent
    pub fn saturates(&self, already_sent: u64) -> bool {
        already_sent.saturating_add(self.on_pool as u64) >= self.capacity
    }
}
