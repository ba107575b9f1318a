//! Update Scheduler
//!
//! Component render effects do not re-run the moment their state changes.
//! Their scheduler puts them in a job queue instead, so that any number of
//! synchronous writes produce a single re-render.
//!
//! # How Flushing Works
//!
//! 1. `queue_job(effect)` appends the effect unless it is already queued
//!    (identity is the effect id, so the queue keeps first-enqueue order).
//! 2. The first job queued after a flush requests a new flush through the
//!    microtask handler, if one is installed.
//! 3. `flush_jobs()` pops jobs from the front and runs the ones still
//!    active. Jobs queued while flushing join the same flush, which repeats
//!    until the queue is empty.
//!
//! Without a microtask handler nothing flushes on its own: call
//! [`next_tick`] (or [`flush_jobs`]) to apply pending updates.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::reactive::{EffectId, ReactiveEffect};

/// Called when a flush should be scheduled. The handler decides when to
/// call [`flush_jobs`], e.g. from `tokio::task::spawn_local`.
pub type MicrotaskHandler = Rc<dyn Fn()>;

thread_local! {
    static QUEUE: RefCell<IndexMap<EffectId, ReactiveEffect>> = RefCell::new(IndexMap::new());
    static FLUSH_PENDING: Cell<bool> = const { Cell::new(false) };
    static FLUSHING: Cell<bool> = const { Cell::new(false) };
    static MICROTASK: RefCell<Option<MicrotaskHandler>> = const { RefCell::new(None) };
}

/// Queue `job` for the next flush. Queuing an already queued job is a no-op.
pub fn queue_job(job: &ReactiveEffect) {
    let inserted = QUEUE.with(|queue| {
        let mut queue = queue.borrow_mut();
        if queue.contains_key(&job.id()) {
            false
        } else {
            queue.insert(job.id(), job.clone());
            true
        }
    });

    if inserted {
        tracing::trace!(job = ?job.id(), "queued job");
        queue_flush();
    }
}

/// Drop `job` from the queue if it is waiting there.
pub fn invalidate_job(job: &ReactiveEffect) {
    let removed = QUEUE.with(|queue| queue.borrow_mut().shift_remove(&job.id()));
    if removed.is_some() {
        tracing::trace!(job = ?job.id(), "invalidated queued job");
    }
}

/// Check if any job is waiting for a flush.
pub fn has_pending_jobs() -> bool {
    QUEUE.with(|queue| !queue.borrow().is_empty())
}

pub fn pending_job_count() -> usize {
    QUEUE.with(|queue| queue.borrow().len())
}

/// Install the hook used to request a flush.
pub fn set_microtask_handler<F>(handler: F)
where
    F: Fn() + 'static,
{
    MICROTASK.with(|slot| *slot.borrow_mut() = Some(Rc::new(handler)));
}

pub fn clear_microtask_handler() {
    let previous = MICROTASK.with(|slot| slot.borrow_mut().take());
    drop(previous);
}

fn queue_flush() {
    if FLUSHING.with(Cell::get) || FLUSH_PENDING.with(|pending| pending.replace(true)) {
        return;
    }

    let handler = MICROTASK.with(|slot| slot.borrow().clone());
    if let Some(handler) = handler {
        handler();
    }
}

/// Resets the flushing flag even if a job panics.
struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        FLUSHING.with(|flushing| flushing.set(false));
    }
}

/// Run queued jobs until the queue is empty. Returns how many ran.
///
/// Calling this from inside a running flush does nothing.
pub fn flush_jobs() -> usize {
    if FLUSHING.with(|flushing| flushing.replace(true)) {
        return 0;
    }
    let _guard = FlushGuard;
    FLUSH_PENDING.with(|pending| pending.set(false));

    let mut ran = 0;
    loop {
        let next = QUEUE.with(|queue| queue.borrow_mut().shift_remove_index(0));
        let Some((_, job)) = next else { break };
        if job.is_active() {
            job.run();
            ran += 1;
        }
    }

    if ran > 0 {
        tracing::debug!(jobs = ran, "flushed job queue");
    }
    ran
}

/// Wait for pending updates to be applied.
///
/// Yields to the executor once (letting a scheduled flush run) and then
/// flushes whatever is still queued, so host state observed after the await
/// reflects every write made before it.
pub async fn next_tick() {
    tokio::task::yield_now().await;
    flush_jobs();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{create_ref, Ref, Scheduler};

    fn queued_effect(counter: Rc<Cell<u32>>, source: Ref) -> ReactiveEffect {
        let scheduler: Scheduler = Rc::new(|effect: &ReactiveEffect| queue_job(effect));
        let effect = ReactiveEffect::with_scheduler(
            move || {
                source.get();
                counter.set(counter.get() + 1);
            },
            scheduler,
        );
        effect.run();
        effect
    }

    #[test]
    fn jobs_are_deduplicated_until_flushed() {
        let runs = Rc::new(Cell::new(0));
        let count = create_ref(0);
        let _effect = queued_effect(runs.clone(), count.clone());
        assert_eq!(runs.get(), 1);

        count.set(1);
        count.set(2);
        count.set(3);
        assert_eq!(pending_job_count(), 1);
        assert_eq!(runs.get(), 1);

        assert_eq!(flush_jobs(), 1);
        assert_eq!(runs.get(), 2);
        assert!(!has_pending_jobs());
    }

    #[test]
    fn invalidated_and_stopped_jobs_do_not_run() {
        let runs = Rc::new(Cell::new(0));
        let count = create_ref(0);
        let job = queued_effect(runs.clone(), count.clone());

        count.set(1);
        invalidate_job(&job);
        assert_eq!(flush_jobs(), 0);

        count.set(2);
        job.stop();
        assert_eq!(flush_jobs(), 0);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn microtask_handler_is_asked_once_per_flush() {
        let requests = Rc::new(Cell::new(0));
        let requests_clone = requests.clone();
        set_microtask_handler(move || requests_clone.set(requests_clone.get() + 1));

        let runs = Rc::new(Cell::new(0));
        let a = create_ref(0);
        let b = create_ref(0);
        let _first = queued_effect(runs.clone(), a.clone());
        let _second = queued_effect(runs.clone(), b.clone());

        a.set(1);
        b.set(1);
        assert_eq!(requests.get(), 1);

        flush_jobs();
        a.set(2);
        assert_eq!(requests.get(), 2);

        flush_jobs();
        clear_microtask_handler();
    }

    #[tokio::test]
    async fn next_tick_applies_pending_jobs() {
        let runs = Rc::new(Cell::new(0));
        let count = create_ref(0);
        let _effect = queued_effect(runs.clone(), count.clone());

        count.set(10);
        count.set(20);
        next_tick().await;

        assert_eq!(runs.get(), 2);
    }
}
