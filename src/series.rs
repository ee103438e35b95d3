//! Sequential runner
//!
//! Runs zero-argument task producers strictly one after another and collects
//! their results in input order.
//!
//! A producer is invoked only once the future of the producer before it has
//! resolved `Ok`. The first `Err` ends the run: no later producer is invoked
//! and the error is handed back untouched, without any partial results.
//!
//! # Example
//!
//! ```rust
//! use seriate::run_in_series;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let producers = (1..=3).map(|n| move || async move { Ok::<_, String>(n * 10) });
//! let results = run_in_series(producers).await;
//! assert_eq!(results, Ok(vec![10, 20, 30]));
//! # }
//! ```

use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, trace};

use crate::event_log::{EventEmitter, EventKind};

/// Type-erased producer, so closures of different types can share one list.
/// Both the closure and its future are `Send`.
pub type BoxProducer<'a, T, E> = Box<dyn FnOnce() -> BoxFuture<'a, Result<T, E>> + Send + 'a>;

/// Run every producer in order and collect the results.
///
/// An empty input resolves to an empty `Vec` without invoking anything.
/// Nothing runs until the returned future is awaited.
pub async fn run_in_series<I, F, Fut, T, E>(producers: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let producers = producers.into_iter();
    let results = Vec::with_capacity(producers.size_hint().0);

    fold_in_series(results, producers, |mut results, value| {
        results.push(value);
        results
    })
    .await
}

/// Like [`run_in_series`], but folds each value into an accumulator.
///
/// `f` sees values in producer order. On the first failure the accumulator is
/// dropped and the producer's error returned.
pub async fn fold_in_series<I, F, Fut, T, E, A, G>(init: A, producers: I, mut f: G) -> Result<A, E>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    G: FnMut(A, T) -> A,
{
    let mut acc = init;

    for (index, produce) in producers.into_iter().enumerate() {
        trace!(index, "invoking producer");
        let value = produce().await?;
        acc = f(acc, value);
    }

    Ok(acc)
}

/// [`run_in_series`] that reports progress to an [`EventEmitter`].
///
/// Emits `SeriesStarted`, then `StepStarted` plus `StepCompleted`/`StepFailed`
/// for each invoked producer, and finally `SeriesCompleted` or `SeriesFailed`.
/// The returned error is still the producer's own.
pub async fn run_in_series_logged<I, F, Fut, T, E>(
    producers: I,
    emitter: &dyn EventEmitter,
) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    I::IntoIter: ExactSizeIterator,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let producers = producers.into_iter();
    let step_count = producers.len();
    let series_start = Instant::now();
    let mut results = Vec::with_capacity(step_count);

    emitter.emit(EventKind::SeriesStarted { step_count });
    debug!(step_count, "Starting series");

    for (index, produce) in producers.enumerate() {
        let step_start = Instant::now();
        emitter.emit(EventKind::StepStarted { index });

        match produce().await {
            Ok(value) => {
                emitter.emit(EventKind::StepCompleted {
                    index,
                    duration_ms: step_start.elapsed().as_millis() as u64,
                });
                results.push(value);
            }
            Err(e) => {
                let error = e.to_string();
                emitter.emit(EventKind::StepFailed {
                    index,
                    error: error.clone(),
                    duration_ms: step_start.elapsed().as_millis() as u64,
                });
                emitter.emit(EventKind::SeriesFailed {
                    failed_index: index,
                    error: error.clone(),
                });
                debug!(index, %error, "Series stopped at failed step");
                return Err(e);
            }
        }
    }

    emitter.emit(EventKind::SeriesCompleted {
        step_count,
        total_duration_ms: series_start.elapsed().as_millis() as u64,
    });
    debug!(step_count, "Series completed");

    Ok(results)
}

/// Ordered list of boxed producers, built up front and run once.
///
/// Producers and their futures must be `Send`, so a `Series` can be moved
/// onto a spawned task. Producers holding `Rc` or `RefCell` borrows across an
/// await go straight to [`run_in_series`] instead, which has no `Send` bound.
///
/// ```rust
/// use seriate::Series;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let base = 40;
/// let results = Series::new()
///     .push(|| async { Ok::<_, String>(1) })
///     .push(move || async move { Ok(base + 2) })
///     .run()
///     .await;
/// assert_eq!(results, Ok(vec![1, 42]));
/// # }
/// ```
pub struct Series<'a, T, E> {
    producers: Vec<BoxProducer<'a, T, E>>,
}

impl<'a, T, E> Series<'a, T, E> {
    pub fn new() -> Self {
        Self {
            producers: Vec::new(),
        }
    }

    /// Append a producer; it runs after every producer pushed before it
    pub fn push<F, Fut>(mut self, producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, E>> + Send + 'a,
    {
        let boxed: BoxProducer<'a, T, E> = Box::new(move || producer().boxed());
        self.producers.push(boxed);
        self
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }

    pub async fn run(self) -> Result<Vec<T>, E> {
        run_in_series(self.producers).await
    }

    pub async fn run_logged(self, emitter: &dyn EventEmitter) -> Result<Vec<T>, E>
    where
        E: Display,
    {
        run_in_series_logged(self.producers, emitter).await
    }
}

impl<T, E> Default for Series<'_, T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for Series<'_, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Series")
            .field("len", &self.len())
            .finish()
    }
}
