//! Concurrent batch fetch.
//!
//! One task per key in a JoinSet. A key is only spawned while fewer than
//! `max_concurrency` tasks are in flight, so the set itself is the bound.
//! Each task yields exactly one tagged outcome, and the collector ends after
//! one outcome per key.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, warn};

use crate::error::{BatchError, CacheError, CacheResult, KeyFailure};
use crate::types::{BatchResult, Fetched, RequestTemplate};

use super::OriginClient;

type Outcome = (String, CacheResult<Fetched>);

pub(super) async fn fetch_batch(
    client: &OriginClient,
    keys: Vec<String>,
    template: &RequestTemplate,
) -> BatchResult {
    let mut result = BatchResult::default();
    if keys.is_empty() {
        return result;
    }

    let requested = keys.len();
    let parallel = client.options().max_concurrency();
    debug!(keys = requested, parallel, "starting batch fetch");

    let template = Arc::new(template.clone());
    let mut join_set: JoinSet<Outcome> = JoinSet::new();
    let mut pending: HashMap<Id, String> = HashMap::with_capacity(requested);
    let mut failures = Vec::new();
    let mut keys = keys.into_iter();

    loop {
        while join_set.len() < parallel {
            let Some(key) = keys.next() else { break };
            let this = client.clone();
            let template = Arc::clone(&template);
            let task_key = key.clone();
            let handle = join_set.spawn(async move {
                let outcome = this.fetch(&task_key, &template).await;
                (task_key, outcome)
            });
            pending.insert(handle.id(), key);
        }

        let Some(joined) = join_set.join_next_with_id().await else {
            break;
        };

        let (key, outcome) = match joined {
            Ok((id, outcome)) => {
                pending.remove(&id);
                outcome
            }
            Err(e) => join_failure(&mut pending, e),
        };

        match outcome {
            Ok(fetched) => {
                result.bodies.insert(key.clone(), fetched.body);
                result.infos.insert(key, fetched.info);
            }
            Err(error) => {
                warn!(key = %key, error = %error, "batch fetch failed for key");
                if let Some(info) = error.info() {
                    result.infos.insert(key.clone(), info.clone());
                }
                failures.push(KeyFailure { key, error });
            }
        }
    }

    debug!(
        keys = requested,
        succeeded = result.bodies.len(),
        failed = failures.len(),
        "batch fetch complete"
    );

    result.error = BatchError::from_failures(failures);
    result
}

/// Map a panicked or cancelled task back to its key.
fn join_failure(pending: &mut HashMap<Id, String>, e: JoinError) -> Outcome {
    let id = e.id();
    let key = match pending.remove(&id) {
        Some(key) => key,
        None => {
            warn!(task = %id, "batch task finished with no recorded key");
            format!("<task {id}>")
        }
    };
    let error = CacheError::Task {
        message: e.to_string(),
    };
    (key, Err(error))
}
