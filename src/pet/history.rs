use glam::Vec2;

/// Samples kept for shake detection.
pub const HISTORY_LEN: usize = 5;

/// Fixed-capacity ring of recent pet positions. No heap allocs after init.
#[derive(Debug, Clone)]
pub struct PositionHistory {
    buf: [Vec2; HISTORY_LEN],
    head: usize,
    len: usize,
}

impl PositionHistory {
    pub fn new() -> Self {
        Self {
            buf: [Vec2::ZERO; HISTORY_LEN],
            head: 0,
            len: 0,
        }
    }

    /// Record a sample, evicting the oldest once full.
    pub fn push(&mut self, pos: Vec2) {
        self.buf[self.head] = pos;
        self.head = (self.head + 1) % HISTORY_LEN;
        if self.len < HISTORY_LEN {
            self.len += 1;
        }
    }

    pub fn is_full(&self) -> bool {
        self.len == HISTORY_LEN
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        let start = if self.len < HISTORY_LEN { 0 } else { self.head };
        (0..self.len).map(move |i| self.buf[(start + i) % HISTORY_LEN])
    }
}

impl Default for PositionHistory {
    fn default() -> Self {
        Self::new()
    }
}
