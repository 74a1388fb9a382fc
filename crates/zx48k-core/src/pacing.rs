//! Execution-pacing engine.
//!
//! Reconciles the host's one-call-per-frame loop with debugger-driven requests
//! of arbitrary size. A [`FramePacer`] counts ticks remaining to the next frame
//! boundary; [`execute_request`] advances a [`PacedTarget`] by one request and
//! fires the boundary side effects at most once per request and exactly once
//! per frame quantum of executed ticks, however the ticks were partitioned.

/// Tick accounting for frame boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FramePacer {
    quantum: u32,
    ticks_until_boundary: i64,
    boundaries: u64,
}

impl FramePacer {
    /// Creates a pacer with a full quantum remaining.
    #[must_use]
    pub const fn new(quantum: u32) -> Self {
        Self {
            quantum,
            ticks_until_boundary: quantum as i64,
            boundaries: 0,
        }
    }

    /// Ticks per frame.
    #[must_use]
    pub const fn quantum(&self) -> u32 {
        self.quantum
    }

    /// Ticks left before the next boundary; negative after an overshoot larger than a quantum.
    #[must_use]
    pub const fn ticks_until_boundary(&self) -> i64 {
        self.ticks_until_boundary
    }

    /// Boundaries crossed since construction or the last reset.
    #[must_use]
    pub const fn boundaries_crossed(&self) -> u64 {
        self.boundaries
    }

    /// Rearms a full quantum.
    pub const fn reset(&mut self) {
        self.ticks_until_boundary = self.quantum as i64;
        self.boundaries = 0;
    }

    /// Accounts for `executed` ticks and reports whether a boundary was crossed.
    ///
    /// On a crossing one quantum is added before `executed` is subtracted, so the
    /// overshoot carries as debt against the next quantum.
    pub const fn account(&mut self, executed: u32) -> bool {
        let executed = executed as i64;
        let crossed = executed >= self.ticks_until_boundary;
        if crossed {
            self.ticks_until_boundary += self.quantum as i64;
            self.boundaries += 1;
        }
        self.ticks_until_boundary -= executed;
        crossed
    }
}

/// A machine driven by [`execute_request`].
pub trait PacedTarget {
    /// The pacer owned by this machine.
    fn pacer(&mut self) -> &mut FramePacer;

    /// Runs whole instructions until at least `requested` ticks have executed or
    /// execution pauses; returns the ticks actually executed.
    fn advance(&mut self, requested: u32) -> u32;

    /// Frame-boundary side effects: swap the video buffer and advance timed
    /// peripherals by exactly one frame period.
    fn frame_boundary(&mut self);

    /// Hands the current visible video buffer (and pending audio) to the host.
    fn deliver_output(&mut self);
}

/// Result of one execution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestOutcome {
    /// Ticks actually executed; may exceed the request by part of an instruction.
    pub executed: u32,
    /// Whether the frame boundary side effects fired during this request.
    pub boundary_crossed: bool,
}

/// Advances `target` by `requested` ticks and applies the pacing rules.
///
/// Output is delivered at the end of every request, boundary or not.
pub fn execute_request<T: PacedTarget + ?Sized>(target: &mut T, requested: u32) -> RequestOutcome {
    let executed = target.advance(requested);
    let boundary_crossed = target.pacer().account(executed);
    if boundary_crossed {
        target.frame_boundary();
    }
    target.deliver_output();
    RequestOutcome {
        executed,
        boundary_crossed,
    }
}
