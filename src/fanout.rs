//! Bounded-concurrency fan-out over a batch of independent items.
//!
//! Upstream store APIs rate-limit per IP, so enriching a batch fully in
//! parallel gets the bot throttled while a serial loop is too slow for
//! interactive use. The middle ground is a counting admission gate capping
//! simultaneous in-flight work.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs `work` over every item with at most `max_concurrency` invocations in
/// flight, returning one result slot per input in input order.
///
/// `out[i]` always corresponds to `items[i]` regardless of completion order.
/// A failing or panicking task fills only its own slot with an `Err`; sibling
/// tasks are unaffected. The call returns only after every task has finished.
pub async fn fanout<T, R, F, Fut>(items: Vec<T>, max_concurrency: usize, work: F) -> Vec<Result<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let gate = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let work = Arc::new(work);
    let total = items.len();

    let mut tasks: JoinSet<(usize, Result<R>)> = JoinSet::new();
    let mut slot_of = HashMap::with_capacity(total);

    for (index, item) in items.into_iter().enumerate() {
        let gate = Arc::clone(&gate);
        let work = Arc::clone(&work);
        let handle = tasks.spawn(async move {
            let permit = match gate.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (index, Err(anyhow!("admission gate closed"))),
            };
            let outcome = work(item).await;
            drop(permit);
            (index, outcome)
        });
        slot_of.insert(handle.id(), index);
    }

    let mut results: Vec<Option<Result<R>>> = (0..total).map(|_| None).collect();
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, (index, outcome))) => results[index] = Some(outcome),
            // A panicked task still gets its own slot; siblings keep running.
            Err(join_err) => {
                if let Some(&index) = slot_of.get(&join_err.id()) {
                    results[index] = Some(Err(anyhow!("fan-out task failed: {join_err}")));
                }
            }
        }
    }

    results
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err(anyhow!("fan-out task produced no result"))))
        .collect()
}
