//! A per-node reader/writer synchronizer with writer preference and a
//! starvation-avoidance hand-off.
//!
//! Unlike a plain `RwLock`, a departing writer that finds readers waiting
//! hands the critical section to the *entire batch* of readers currently
//! waiting, as one indivisible step, before any writer that arrived in the
//! meantime gets a turn. This is what keeps a hand-over-hand reader chain
//! from starving behind a stream of writers on a hot ancestor, while still
//! giving writers preference over any one reader that merely arrives after
//! them.
//!
//! Built on [`parking_lot::Mutex`]/[`parking_lot::Condvar`] rather than the
//! standard library's equivalents: `parking_lot`'s primitives never poison,
//! which matters here because a panic unwinding through a caller's traversal
//! must not leave this lock permanently unusable for every other thread in
//! the tree.

use parking_lot::{Condvar, Mutex};

/// Internal counters guarded by one mutex. See the module docs for the
/// admission protocol these implement.
#[derive(Debug, Default)]
struct State {
    /// Readers currently inside the critical section.
    rcount: u32,
    /// Writers currently inside (0 or 1).
    wcount: u32,
    /// Readers blocked in `reader_enter`.
    rwait: u32,
    /// Writers blocked in `writer_enter`.
    wwait: u32,
    /// One-shot flag: a departing writer is granting the section to the
    /// batch of readers that were waiting at the moment of its release.
    handoff: bool,
}

impl State {
    fn check_invariants(&self) {
        debug_assert!(self.wcount <= 1);
        debug_assert!(self.rcount == 0 || self.wcount == 0);
        debug_assert!(!self.handoff || self.wcount == 0);
    }
}

/// The per-node reader/writer synchronizer.
///
/// Every [`crate::tree::Node`] owns exactly one of these, guarding that
/// node's children map. `NodeSync` has no knowledge of the tree shape: it is
/// a pure concurrency primitive, used by the traversal code in
/// [`crate::tree`].
#[derive(Debug, Default)]
pub struct NodeSync {
    state: Mutex<State>,
    readers_cv: Condvar,
    writers_cv: Condvar,
}

impl NodeSync {
    /// Creates a synchronizer with no readers or writers active or waiting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until reader protection is granted.
    pub fn reader_enter(&self) {
        let mut state = self.state.lock();
        state.rwait += 1;
        if (state.wcount > 0 || state.wwait > 0) && !state.handoff {
            loop {
                self.readers_cv.wait(&mut state);
                if !(state.wcount > 0 && !state.handoff) {
                    break;
                }
            }
        }
        state.rwait -= 1;
        state.rcount += 1;
        state.handoff = false;
        if state.rwait > 0 {
            // Chain the hand-off: wake the next waiting reader so the whole
            // batch is admitted before any writer gets a look in.
            self.readers_cv.notify_one();
        }
        state.check_invariants();
    }

    /// Releases a previously granted reader protection.
    pub fn reader_leave(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.rcount > 0, "reader_leave without matching reader_enter");
        state.rcount -= 1;
        if state.rcount == 0 && state.wwait > 0 {
            self.writers_cv.notify_one();
        }
        state.check_invariants();
    }

    /// Blocks until writer protection is granted.
    pub fn writer_enter(&self) {
        let mut state = self.state.lock();
        state.wwait += 1;
        while state.wcount > 0 || state.rcount > 0 || state.handoff {
            self.writers_cv.wait(&mut state);
        }
        state.wwait -= 1;
        state.wcount += 1;
        state.check_invariants();
    }

    /// Releases a previously granted writer protection, triggering the
    /// hand-off to any waiting readers before preferring a waiting writer.
    pub fn writer_leave(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.wcount == 1, "writer_leave without matching writer_enter");
        state.wcount -= 1;
        if state.rwait > 0 {
            state.handoff = true;
            self.readers_cv.notify_one();
        } else if state.wwait > 0 {
            self.writers_cv.notify_one();
        }
        state.check_invariants();
    }

    /// Returns `true` if no reader or writer currently holds or awaits
    /// protection. Used only by tests to assert quiescence.
    #[cfg(test)]
    pub(crate) fn is_quiescent(&self) -> bool {
        let state = self.state.lock();
        state.rcount == 0 && state.wcount == 0 && state.rwait == 0 && state.wwait == 0
    }
}
