use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::picks_fetch;
use crate::state::Delta;

/// Lifetime of one mount's requests. Dropping it cancels publication of any
/// request still in flight.
#[derive(Debug)]
pub struct FetchScope {
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl FetchScope {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

impl Drop for FetchScope {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Starts the picks and results requests on their own threads. Each publishes
/// exactly one outcome unless the returned scope is gone by then.
pub fn mount(tx: Sender<Delta>, base_url: &str, generation: u64) -> FetchScope {
    let scope = FetchScope::new(generation);
    info!(generation, base_url, "mounting pick fetchers");

    let picks_tx = tx.clone();
    let picks_base = base_url.to_string();
    let picks_cancel = scope.token();
    thread::spawn(move || {
        let outcome = picks_fetch::fetch_picks(&picks_base);
        if picks_cancel.load(Ordering::Acquire) {
            debug!(generation, "picks settled after teardown, dropped");
            return;
        }
        match outcome {
            Ok(payload) => {
                if !payload.was_array {
                    warn!(generation, "picks payload is not an array");
                    let _ = picks_tx.send(Delta::Log(
                        "[WARN] Picks payload was not an array; showing none".to_string(),
                    ));
                }
                let _ = picks_tx.send(Delta::SetPicks {
                    generation,
                    picks: payload.picks,
                    fetched_at: Utc::now(),
                });
            }
            Err(err) => {
                warn!(generation, error = %err, "error fetching MLB picks");
                let _ = picks_tx.send(Delta::PicksFailed {
                    generation,
                    error: format!("{err:#}"),
                });
            }
        }
    });

    let results_base = base_url.to_string();
    let results_cancel = scope.token();
    thread::spawn(move || {
        let outcome = picks_fetch::fetch_results(&results_base);
        if results_cancel.load(Ordering::Acquire) {
            debug!(generation, "results settled after teardown, dropped");
            return;
        }
        let delta = match outcome {
            Ok(results) => Delta::SetResults {
                generation,
                results,
            },
            Err(err) => {
                warn!(generation, error = %err, "error fetching results");
                Delta::ResultsFailed {
                    generation,
                    error: format!("{err:#}"),
                }
            }
        };
        let _ = tx.send(delta);
    });

    scope
}
