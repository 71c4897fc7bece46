use std::num::NonZero;

use rayon::prelude::*;
use tracing::debug;

use crate::Error;

/// Fixed-size pool of worker threads that maps a function over a slice of items.
///
/// The threads are started when the pool is created and stay alive until the pool is dropped,
/// so a single [`map()`][Self::map] call only pays for handing out work, not for thread creation.
///
/// # Examples
///
/// ```
/// use new_zealand::nz;
/// use sum_pools::ThreadPool;
///
/// let pool = ThreadPool::new(nz!(4)).unwrap();
///
/// let squares = pool.map(&[1_u64, 2, 3, 4, 5], |x| x * x);
///
/// // Results are returned in item order, no matter which thread computed them.
/// assert_eq!(squares, vec![1, 4, 9, 16, 25]);
/// ```
#[derive(Debug)]
pub struct ThreadPool {
    inner: rayon::ThreadPool,
    thread_count: NonZero<usize>,
}

impl ThreadPool {
    /// Creates a thread pool with `thread_count` worker threads.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadPoolBuild`] if the worker threads cannot be started.
    pub fn new(thread_count: NonZero<usize>) -> crate::Result<Self> {
        let inner = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count.get())
            .thread_name(|worker_index| format!("sum-pool-{worker_index}"))
            .build()
            .map_err(Error::ThreadPoolBuild)?;

        debug!(thread_count = thread_count.get(), "thread pool started");

        Ok(Self {
            inner,
            thread_count,
        })
    }

    /// Returns the number of threads in the pool.
    #[must_use]
    pub fn thread_count(&self) -> NonZero<usize> {
        self.thread_count
    }

    /// Applies `f` to every item on the pool's threads and returns the results in item order.
    ///
    /// Items are picked up by whichever thread is idle, so there is no ordering guarantee
    /// between the items while they execute. The call blocks until every item has been
    /// processed.
    ///
    /// # Panics
    ///
    /// A panic in `f` is resumed on the calling thread.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Send + Sync,
    {
        self.inner.install(|| items.par_iter().map(f).collect())
    }
}
