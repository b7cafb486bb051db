//! Per-tick input.  The front-end captures an immutable snapshot of the
//! held keys once per tick; the tracker diffs it against the previous
//! snapshot to find fresh presses.

/// Keys held at the start of a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub left: bool,
    pub right: bool,
    pub fire: bool,
}

/// A snapshot plus the edges computed against the previous tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub left: bool,
    pub right: bool,
    pub fire_held: bool,
    /// Fire is down this tick and was up the tick before.
    pub fire_pressed: bool,
}

#[derive(Clone, Debug, Default)]
pub struct InputTracker {
    previous: InputSnapshot,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this tick's snapshot and return it with its edges.
    pub fn observe(&mut self, current: InputSnapshot) -> InputFrame {
        let frame = InputFrame {
            left: current.left,
            right: current.right,
            fire_held: current.fire,
            fire_pressed: current.fire && !self.previous.fire,
        };
        self.previous = current;
        frame
    }

    /// Forget the previous snapshot, so a key still held when a round
    /// starts counts as a fresh press.
    pub fn reset(&mut self) {
        self.previous = InputSnapshot::default();
    }
}
