//! Permit pool shared by every submission.
//!
//! The pool state is a single `AtomicU64`:
//!
//! | bits    | field      |
//! |---------|------------|
//! | 48..64  | generation |
//! | 24..48  | live       |
//! | 0..24   | issued     |
//!
//! `issued` counts permits taken from the pool, `live` counts the subset
//! still guarded by a running call. Acquire, release, retire and refill are
//! all compare-and-swap loops on that word, so every interleaving keeps
//! `live <= issued <= capacity`.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};

const FIELD_BITS: u32 = 24;
const FIELD_MASK: u64 = (1 << FIELD_BITS) - 1;

/// How permits return to the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PermitPolicy {
    /// Permits are consumed per attempt and only restored by the periodic
    /// refill. At most `capacity` submissions are admitted per window.
    #[default]
    PerWindow,
    /// Permits are returned as soon as the guarded call completes. At most
    /// `capacity` calls are in flight at once. A refill never restores a
    /// permit whose call is still running; it only recovers permits that
    /// were retired without being returned.
    Concurrency,
}

impl PermitPolicy {
    /// Whether completing a call hands its permit back immediately.
    pub fn releases_on_completion(&self) -> bool {
        matches!(self, PermitPolicy::Concurrency)
    }
}

/// Proof that a permit was issued.
///
/// Deliberately neither `Clone` nor `Copy`: a ticket can be released once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a ticket without releasing or retiring it leaks the permit"]
pub struct Ticket {
    generation: u16,
    held: bool,
}

impl Ticket {
    /// Window generation the permit was issued in.
    pub fn generation(&self) -> u32 {
        u32::from(self.generation)
    }

    /// Whether the permit counts as in flight until released or retired.
    pub fn is_held(&self) -> bool {
        self.held
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct State {
    generation: u16,
    live: u32,
    issued: u32,
}

impl State {
    #[inline]
    fn unpack(word: u64) -> Self {
        Self {
            generation: (word >> (2 * FIELD_BITS)) as u16,
            live: ((word >> FIELD_BITS) & FIELD_MASK) as u32,
            issued: (word & FIELD_MASK) as u32,
        }
    }

    #[inline]
    fn pack(self) -> u64 {
        (u64::from(self.generation) << (2 * FIELD_BITS))
            | (u64::from(self.live) << FIELD_BITS)
            | u64::from(self.issued)
    }
}

/// Fixed-capacity pool of submission permits.
///
/// Window permits ([`PermitPool::try_acquire`]) stay consumed until the next
/// refill. Held permits ([`PermitPool::try_acquire_held`]) survive refills
/// until they are released or retired, so they bound calls in flight.
///
/// The generation is 16 bits wide and wraps after 65 536 refills.
///
/// # Example
///
/// ```
/// use document_gateway::PermitPool;
/// use std::num::NonZeroU32;
///
/// let pool = PermitPool::new(NonZeroU32::new(2).unwrap());
/// let first = pool.try_acquire().unwrap();
/// let _second = pool.try_acquire().unwrap();
/// assert!(pool.try_acquire().is_none());
///
/// // A release hands the permit back within the same window
/// assert!(pool.release(first));
/// assert_eq!(pool.available(), 1);
///
/// // A refill restores full capacity
/// pool.refill();
/// assert_eq!(pool.available(), 2);
/// ```
#[derive(Debug)]
pub struct PermitPool {
    state: AtomicU64,
    capacity: u32,
}

impl PermitPool {
    /// Largest capacity a pool can track.
    pub const MAX_CAPACITY: u32 = FIELD_MASK as u32;

    /// Create a full pool. Capacities above [`PermitPool::MAX_CAPACITY`]
    /// are clamped to it.
    pub fn new(capacity: NonZeroU32) -> Self {
        Self {
            state: AtomicU64::new(0),
            capacity: capacity.get().min(Self::MAX_CAPACITY),
        }
    }

    /// Maximum number of permits.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Permits available right now.
    pub fn available(&self) -> u32 {
        self.capacity - self.load().issued
    }

    /// Held permits whose calls have not completed yet.
    pub fn in_flight(&self) -> u32 {
        self.load().live
    }

    /// Current window generation. Advances on every refill that restored
    /// at least one permit.
    pub fn generation(&self) -> u32 {
        u32::from(self.load().generation)
    }

    /// Take one window permit if any is available. Never blocks.
    pub fn try_acquire(&self) -> Option<Ticket> {
        self.acquire(false)
    }

    /// Take one held permit if any is available. Never blocks.
    ///
    /// The permit stays counted until [`PermitPool::release`] or
    /// [`PermitPool::retire`], whatever refills happen in between.
    pub fn try_acquire_held(&self) -> Option<Ticket> {
        self.acquire(true)
    }

    fn acquire(&self, held: bool) -> Option<Ticket> {
        let capacity = self.capacity;
        self.update(|mut state| {
            if state.issued >= capacity {
                return None;
            }
            state.issued += 1;
            if held {
                state.live += 1;
            }
            Some(state)
        })
        .map(|previous| Ticket {
            generation: previous.generation,
            held,
        })
    }

    /// Return a permit to the pool.
    ///
    /// A held permit always goes back. A window permit goes back only within
    /// the window it was issued in; after a refill the release is discarded
    /// and `false` is returned, since that capacity was already restored.
    pub fn release(&self, ticket: Ticket) -> bool {
        self.update(|mut state| {
            if ticket.held {
                // live <= issued, so both are positive
                if state.live == 0 {
                    return None;
                }
                state.live -= 1;
                state.issued -= 1;
            } else {
                if state.generation != ticket.generation || state.issued <= state.live {
                    return None;
                }
                state.issued -= 1;
            }
            Some(state)
        })
        .is_some()
    }

    /// Finish with a permit without returning it: it stays consumed until
    /// the next refill. A no-op for window permits.
    pub fn retire(&self, ticket: Ticket) {
        if !ticket.held {
            return;
        }
        let _ = self.update(|mut state| {
            if state.live == 0 {
                return None;
            }
            state.live -= 1;
            Some(state)
        });
    }

    /// Restore every permit that is not held by a running call and start a
    /// new window.
    ///
    /// Returns the number of permits restored. A pool with nothing to restore
    /// is left untouched (same generation), which makes repeated refills
    /// idempotent.
    pub fn refill(&self) -> u32 {
        match self.update(|mut state| {
            if state.issued <= state.live {
                return None;
            }
            state.issued = state.live;
            state.generation = state.generation.wrapping_add(1);
            Some(state)
        }) {
            Some(previous) => previous.issued - previous.live,
            None => 0,
        }
    }

    #[inline]
    fn load(&self) -> State {
        State::unpack(self.state.load(Ordering::Acquire))
    }

    /// CAS loop applying `f`; returns the state it replaced.
    #[inline]
    fn update(&self, mut f: impl FnMut(State) -> Option<State>) -> Option<State> {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                f(State::unpack(word)).map(State::pack)
            })
            .ok()
            .map(State::unpack)
    }
}
