//! Frame-source boundary.
//!
//! The engine never owns a timer. A host (the browser's animation-frame loop,
//! the offline simulator, a test) calls [`FrameScheduler::dispatch`] with its
//! own timestamps, and every live subscription runs synchronously inside that
//! call. Subscriptions are scoped: dropping the [`FrameSubscription`] guard
//! releases the callback, so a torn-down carousel stops receiving frames.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::carousel::Carousel;

/// Timing information handed to each subscriber.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    pub timestamp_ms: f64,
    pub elapsed_ms: f32,
}

/// Converts absolute host timestamps into per-frame elapsed time.
#[derive(Clone, Debug, Default)]
pub struct FrameClock {
    last_timestamp_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed time since the previous call. The first frame, and any
    /// timestamp that goes backwards, report 0.
    pub fn tick(&mut self, timestamp_ms: f64) -> f32 {
        if !timestamp_ms.is_finite() {
            return 0.0;
        }
        let elapsed = match self.last_timestamp_ms {
            Some(last) if timestamp_ms > last => (timestamp_ms - last) as f32,
            _ => 0.0,
        };
        self.last_timestamp_ms = Some(timestamp_ms);
        elapsed
    }

    /// Forget the previous timestamp, e.g. after the host loop was stopped.
    pub fn reset(&mut self) {
        self.last_timestamp_ms = None;
    }
}

type FrameCallback = Box<dyn FnMut(FrameTick)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    /// `None` while the callback is running.
    callbacks: BTreeMap<u64, Option<FrameCallback>>,
}

/// Single-threaded registry of per-frame callbacks.
#[derive(Default)]
pub struct FrameScheduler {
    registry: Rc<RefCell<Registry>>,
    clock: FrameClock,
    pending: Vec<u64>,
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("subscribers", &self.subscriber_count())
            .field("clock", &self.clock)
            .finish()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` until the returned guard is dropped.
    pub fn subscribe(&self, callback: impl FnMut(FrameTick) + 'static) -> FrameSubscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.insert(id, Some(Box::new(callback)));
        log::debug!("Frame subscription {} acquired", id);
        FrameSubscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().callbacks.len()
    }

    /// Run one frame at `timestamp_ms` (host clock, milliseconds).
    ///
    /// Callbacks run in subscription order. A callback may drop any
    /// subscription, including its own; callbacks subscribed during dispatch
    /// first run on the next frame.
    pub fn dispatch(&mut self, timestamp_ms: f64) -> FrameTick {
        let tick = FrameTick {
            timestamp_ms,
            elapsed_ms: self.clock.tick(timestamp_ms),
        };

        self.pending.clear();
        self.pending.extend(self.registry.borrow().callbacks.keys().copied());

        for &id in &self.pending {
            let taken = self
                .registry
                .borrow_mut()
                .callbacks
                .get_mut(&id)
                .and_then(Option::take);
            let Some(mut callback) = taken else {
                continue;
            };
            callback(tick);
            // Put it back unless the subscription was released meanwhile; a
            // released callback is dropped outside the borrow.
            let released = {
                let mut registry = self.registry.borrow_mut();
                match registry.callbacks.get_mut(&id) {
                    Some(slot) => {
                        *slot = Some(callback);
                        None
                    }
                    None => Some(callback),
                }
            };
            drop(released);
        }
        tick
    }

    /// Restart elapsed-time tracking; the next dispatch reports 0 elapsed.
    pub fn reset_clock(&mut self) {
        self.clock.reset();
    }
}

/// Guard for a registered frame callback.
#[must_use = "dropping the subscription releases the frame callback immediately"]
pub struct FrameSubscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl FrameSubscription {
    /// Whether the callback is still registered.
    pub fn is_active(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => {
                let active = registry.borrow().callbacks.contains_key(&self.id);
                active
            }
            None => false,
        }
    }

    /// Release the callback now.
    pub fn cancel(self) {}
}

impl std::fmt::Debug for FrameSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSubscription").field("id", &self.id).finish()
    }
}

impl Drop for FrameSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let removed = registry.borrow_mut().callbacks.remove(&self.id);
            drop(removed);
            log::debug!("Frame subscription {} released", self.id);
        }
    }
}

/// Drive `carousel` from `scheduler`. After each step `render` receives the
/// carousel, whose [`Carousel::visual_states`] hold the frame's output.
pub fn mount(
    scheduler: &FrameScheduler,
    carousel: Rc<RefCell<Carousel>>,
    mut render: impl FnMut(FrameTick, &Carousel) + 'static,
) -> FrameSubscription {
    scheduler.subscribe(move |tick| {
        let mut carousel = carousel.borrow_mut();
        carousel.step(tick.elapsed_ms);
        render(tick, &carousel);
    })
}
