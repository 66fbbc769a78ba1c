use tracing::debug;

/// Shift every note of one owner whose rank lies in
/// `low_exclusive < order <= high_inclusive` by `delta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeShift {
    pub low_exclusive: i64,
    pub high_inclusive: i64,
    pub delta: i64,
}

impl RangeShift {
    pub fn contains(&self, order: i64) -> bool {
        order > self.low_exclusive && order <= self.high_inclusive
    }

    /// Rank after the shift for a note that is not the one being moved.
    pub fn apply(&self, order: i64) -> i64 {
        if self.contains(order) {
            order + self.delta
        } else {
            order
        }
    }
}

/// What a single-note move writes: an optional shift of the notes in between,
/// then the moved note's new rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    pub old_order: i64,
    pub new_order: i64,
    pub shift: Option<RangeShift>,
}

impl MovePlan {
    pub fn is_noop(&self) -> bool {
        self.old_order == self.new_order
    }
}

/// Clamp a requested rank into `[0, max_order]`.
///
/// Negative targets land at the front and targets past the end land on the
/// owner's current highest rank, so a move never widens the rank range.
pub fn clamp_target(requested: i64, max_order: i64) -> i64 {
    let clamped = requested.clamp(0, max_order.max(0));
    if clamped != requested {
        debug!(requested, clamped, max_order, "Clamped move target");
    }
    clamped
}

/// Plan moving the note at `old_order` to `requested`.
pub fn plan_move(old_order: i64, requested: i64, max_order: i64) -> MovePlan {
    let new_order = clamp_target(requested, max_order);

    let shift = if new_order > old_order {
        // Close the gap behind the note: (old, new] slides down one.
        Some(RangeShift {
            low_exclusive: old_order,
            high_inclusive: new_order,
            delta: -1,
        })
    } else if new_order < old_order {
        // Open a slot in front: [new, old) slides up one.
        Some(RangeShift {
            low_exclusive: new_order - 1,
            high_inclusive: old_order - 1,
            delta: 1,
        })
    } else {
        None
    };

    MovePlan {
        old_order,
        new_order,
        shift,
    }
}
