//! "Chef decides" selection sequence
//!
//! Idle -> Running -> Settling -> Done -> Idle
//!
//! Running shows `ticks` uniformly random draws (with replacement) spaced
//! `tick_interval_ms` apart, first one at start. One interval after the last
//! tick an independent draw becomes the winner and is held for `settle_ms`,
//! then the finished session is handed back and the animator is Idle again.
//! With the defaults that is 20 x 80 + 800 = 2400 ms of scheduled time.
//!
//! Draws go through [`Picker`] so tests can seed or script them.

use crate::domain::types::{InteractionContext, ItemId, MenuItem};
use crate::infra::config::Config;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Source of uniform indices into the candidate pool
pub trait Picker: Send {
    /// Return an index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

/// Uniform picker backed by a seedable RNG
pub struct RandomPicker {
    rng: StdRng,
}

impl RandomPicker {
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }
}

impl Picker for RandomPicker {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Replays a fixed list of indices, then keeps returning 0
#[derive(Debug, Clone, Default)]
pub struct ScriptedPicker {
    indices: VecDeque<usize>,
}

impl ScriptedPicker {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        Self { indices: indices.into_iter().collect() }
    }
}

impl Picker for ScriptedPicker {
    fn pick(&mut self, len: usize) -> usize {
        self.indices.pop_front().unwrap_or(0) % len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Running,
    Settling,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartRejected {
    #[error("selection session already {0:?}")]
    Busy(SessionStatus),
    #[error("detail view is open")]
    DetailOpen,
    #[error("cart drawer is open")]
    CartOpen,
    #[error("candidate pool is empty")]
    EmptyPool,
}

/// Timing of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTiming {
    pub ticks: u32,
    pub tick_interval_ms: u64,
    pub settle_ms: u64,
}

impl SelectionTiming {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ticks: config.selection_ticks(),
            tick_interval_ms: config.tick_interval_ms(),
            settle_ms: config.settle_ms(),
        }
    }

    /// Scheduled time from start to Done
    pub fn total_ms(&self) -> u64 {
        u64::from(self.ticks) * self.tick_interval_ms + self.settle_ms
    }
}

impl Default for SelectionTiming {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// One running "chef decides" sequence
#[derive(Debug, Clone)]
pub struct SelectionSession {
    pub id: String,
    pub status: SessionStatus,
    pub pool: Vec<MenuItem>,
    pub ticks_elapsed: u32,
    pub current_displayed: Option<MenuItem>,
    pub winner: Option<MenuItem>,
    /// Ids shown by each tick, in order
    pub displayed: SmallVec<[ItemId; 20]>,
    pub started_at_ms: u64,
    next_at_ms: u64,
}

/// Output of [`SelectionAnimator::advance`]
#[derive(Debug, Clone)]
pub enum AnimatorEvent {
    /// A shuffle frame
    Tick { session_id: String, tick: u32, item: MenuItem },
    /// Winner drawn and on display
    Settled { session_id: String, winner: MenuItem },
    /// Session finished; carries the final session (status Done, winner set)
    Done(SelectionSession),
}

pub struct SelectionAnimator {
    timing: SelectionTiming,
    picker: Box<dyn Picker>,
    session: Option<SelectionSession>,
}

impl SelectionAnimator {
    pub fn new(timing: SelectionTiming, picker: Box<dyn Picker>) -> Self {
        Self { timing, picker, session: None }
    }

    pub fn timing(&self) -> &SelectionTiming {
        &self.timing
    }

    pub fn status(&self) -> SessionStatus {
        self.session.as_ref().map_or(SessionStatus::Idle, |s| s.status)
    }

    /// True while Running or Settling
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&SelectionSession> {
        self.session.as_ref()
    }

    /// Start a session. The first tick is due immediately; call `advance` to run it.
    pub fn start(
        &mut self,
        pool: Vec<MenuItem>,
        now_ms: u64,
        ctx: &InteractionContext,
    ) -> Result<&SelectionSession, StartRejected> {
        if let Some(session) = &self.session {
            return Err(StartRejected::Busy(session.status));
        }
        if ctx.detail_open {
            return Err(StartRejected::DetailOpen);
        }
        if ctx.cart_open {
            return Err(StartRejected::CartOpen);
        }
        if pool.is_empty() {
            return Err(StartRejected::EmptyPool);
        }

        let session = SelectionSession {
            id: Uuid::now_v7().to_string(),
            status: SessionStatus::Running,
            pool,
            ticks_elapsed: 0,
            current_displayed: None,
            winner: None,
            displayed: SmallVec::new(),
            started_at_ms: now_ms,
            next_at_ms: now_ms,
        };

        info!(
            session_id = %session.id,
            pool_size = %session.pool.len(),
            ticks = %self.timing.ticks,
            "selection_started"
        );

        Ok(self.session.insert(session))
    }

    /// Run every step that is due at `now_ms`, in order
    pub fn advance(&mut self, now_ms: u64) -> Vec<AnimatorEvent> {
        let mut events = Vec::new();

        while let Some(session) = self.session.as_mut() {
            if session.next_at_ms > now_ms {
                break;
            }

            match session.status {
                SessionStatus::Running if session.ticks_elapsed < self.timing.ticks => {
                    let item = session.pool[self.picker.pick(session.pool.len())].clone();
                    session.ticks_elapsed += 1;
                    session.displayed.push(item.id.clone());
                    session.current_displayed = Some(item.clone());
                    session.next_at_ms += self.timing.tick_interval_ms;
                    events.push(AnimatorEvent::Tick {
                        session_id: session.id.clone(),
                        tick: session.ticks_elapsed,
                        item,
                    });
                }
                SessionStatus::Running => {
                    let winner = session.pool[self.picker.pick(session.pool.len())].clone();
                    session.status = SessionStatus::Settling;
                    session.current_displayed = Some(winner.clone());
                    session.winner = Some(winner.clone());
                    session.next_at_ms += self.timing.settle_ms;
                    debug!(session_id = %session.id, winner = %winner.id, "selection_settling");
                    events.push(AnimatorEvent::Settled { session_id: session.id.clone(), winner });
                }
                SessionStatus::Settling | SessionStatus::Done | SessionStatus::Idle => {
                    if let Some(mut finished) = self.session.take() {
                        finished.status = SessionStatus::Done;
                        events.push(AnimatorEvent::Done(finished));
                    }
                }
            }
        }

        events
    }

    /// Deadline of the next step, if a session is running
    pub fn next_deadline(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.next_at_ms)
    }

    /// Tear the session down without producing a winner
    pub fn cancel(&mut self) -> Option<SelectionSession> {
        let session = self.session.take()?;
        info!(
            session_id = %session.id,
            ticks_elapsed = %session.ticks_elapsed,
            status = ?session.status,
            "selection_cancelled"
        );
        Some(session)
    }
}
