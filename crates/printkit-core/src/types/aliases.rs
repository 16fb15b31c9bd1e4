//! Type aliases for commonly used complex types.
//!
//! Boxed callbacks and lock wrappers appear across the designer, the scene
//! synchronizer and the persistence layer; naming them keeps signatures
//! short and consistent.

use parking_lot::Mutex;
use std::sync::Arc;

/// A thread-safe, mutex-protected wrapper for cross-thread sharing.
///
/// Uses `parking_lot::Mutex`.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// A callback that receives a single parameter.
///
/// Thread-safe, suitable for cross-thread data notification.
pub type DataCallback<T> = Box<dyn Fn(T) + Send + Sync>;

/// A progress callback receiving (current, total) values.
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Create a new `ThreadSafe<T>` from a value.
///
/// # Example
/// ```rust,ignore
/// let counter = thread_safe(0usize);
/// *counter.lock() += 1;
/// ```
#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}
