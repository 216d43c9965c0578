//! Observable state cells.
//!
//! [`Signal<T>`] is the primitive every store is built from: a value with
//! `get`/`set`/`update` and push-based change notification. Effects registered
//! through [`Signal::subscribe`] run synchronously, on the caller's task, after
//! each write has completed and the value lock has been released, so an effect
//! may freely read this cell or write other cells.
//!
//! # Example
//!
//! ```rust
//! use finance_client::reactive::Signal;
//! use std::sync::{Arc, Mutex};
//!
//! let counter = Signal::new(0);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! let sub = counter.subscribe(move |value| sink.lock().unwrap().push(*value));
//!
//! counter.set(1);
//! counter.update(|value| *value += 1);
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
//!
//! drop(sub);
//! counter.set(3);
//! assert_eq!(seen.lock().unwrap().len(), 2);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

type Effect<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct SignalInner<T> {
    value: RwLock<T>,
    /// Incremented on every write.
    version: AtomicU64,
    effects: Mutex<Vec<(u64, Effect<T>)>>,
    next_effect_id: AtomicU64,
}

/// A reactive value that notifies subscribers on every write.
///
/// Cloning a `Signal` yields another handle to the same cell.
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    /// Create a cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                value: RwLock::new(value),
                version: AtomicU64::new(0),
                effects: Mutex::new(Vec::new()),
                next_effect_id: AtomicU64::new(0),
            }),
        }
    }

    /// Clone out the current value.
    pub fn get(&self) -> T {
        self.inner
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read the current value by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self
            .inner
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Number of writes since creation.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Replace the value and run every effect.
    pub fn set(&self, value: T) {
        self.update(|slot| *slot = value);
    }

    /// Mutate the value in place and run every effect.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let snapshot = {
            let mut guard = self
                .inner
                .value
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            f(&mut guard);
            self.inner.version.fetch_add(1, Ordering::Release);
            guard.clone()
        };
        self.notify(&snapshot);
    }

    /// Register an effect that runs after every subsequent write.
    ///
    /// The effect stays attached until the returned [`Subscription`] is dropped.
    pub fn subscribe(&self, effect: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_effect_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .effects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(effect)));

        let weak: Weak<SignalInner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner
                        .effects
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .retain(|(effect_id, _)| *effect_id != id);
                }
            })),
        }
    }

    /// Run `effect` now with the current value, then after every write.
    pub fn effect(&self, effect: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let current = self.get();
        effect(&current);
        self.subscribe(effect)
    }

    /// A handle that can read and subscribe but not write.
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal {
            signal: self.clone(),
        }
    }

    /// Number of attached effects.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .effects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn notify(&self, value: &T) {
        // Snapshot the list so effects can subscribe or write without deadlocking.
        let effects: Vec<Effect<T>> = self
            .inner
            .effects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, effect)| Arc::clone(effect))
            .collect();
        for effect in effects {
            effect(value);
        }
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &self.get())
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

/// Read-only handle to a [`Signal`]: observe, never write.
///
/// Owners hand these out so every write keeps going through their own setter.
pub struct ReadSignal<T> {
    signal: Signal<T>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ReadSignal<T> {
    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    pub fn version(&self) -> u64 {
        self.signal.version()
    }

    /// See [`Signal::subscribe`].
    pub fn subscribe(&self, effect: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.signal.subscribe(effect)
    }

    /// See [`Signal::effect`].
    pub fn effect(&self, effect: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.signal.effect(effect)
    }
}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadSignal").field(&self.signal).finish()
    }
}

/// Handle keeping an effect attached to its [`Signal`].
///
/// Dropping it detaches the effect; later writes no longer reach it.
#[must_use = "dropping a Subscription detaches the effect immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Detach now. Equivalent to dropping the handle.
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_version() {
        let cell = Signal::new(String::from("a"));
        assert_eq!(cell.get(), "a");
        assert_eq!(cell.version(), 0);

        cell.set("b".to_string());
        assert_eq!(cell.get(), "b");
        assert_eq!(cell.version(), 1);

        cell.update(|value| value.push('c'));
        assert_eq!(cell.with(String::len), 2);
        assert_eq!(cell.version(), 2);
    }

    #[test]
    fn test_effect_runs_once_per_write() {
        let cell = Signal::new(0_u32);
        let calls = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&calls);
        let _sub = cell.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        cell.set(1);
        cell.set(1);
        cell.update(|value| *value += 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_effect_sees_new_value() {
        let cell = Signal::new(1);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _sub = cell.effect(move |value| sink.lock().unwrap().push(*value));
        cell.set(5);

        assert_eq!(*seen.lock().unwrap(), vec![1, 5]);
    }

    #[test]
    fn test_dropped_subscription_is_detached() {
        let cell = Signal::new(0);
        let calls = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&calls);
        let sub = cell.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(cell.subscriber_count(), 1);

        cell.set(1);
        sub.unsubscribe();
        cell.set(2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn test_effect_can_write_other_cell_and_read_self() {
        let source = Signal::new(2);
        let doubled = Signal::new(0);

        let target = doubled.clone();
        let reader = source.clone();
        let _sub = source.subscribe(move |value| {
            assert_eq!(reader.get(), *value);
            target.set(value * 2);
        });

        source.set(21);
        assert_eq!(doubled.get(), 42);
    }

    #[test]
    fn test_read_only_handle_follows_writes() {
        let signal = Signal::new(1);
        let view = signal.read_only();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = view.subscribe(move |value| sink.lock().unwrap().push(*value));

        signal.set(2);

        assert_eq!(view.get(), 2);
        assert_eq!(view.version(), signal.version());
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_subscription_outliving_signal() {
        let cell = Signal::new(0);
        let sub = cell.subscribe(|_| {});
        drop(cell);
        drop(sub);
    }
}
