//! Check-then-insert of completions.
//!
//! A pair goes through three gates, cheapest first: the in-pass dedupe set, a lookup of the
//! `(item, team)` key in the store, and finally the insert itself. A unique-key conflict on insert
//! means another writer got there first and is treated exactly like an existing completion.

use std::future::Future;
use std::time::Duration;

use crate::engine::dedup::PassDedupe;
use crate::error::StoreError;
use crate::store::BoardStore;
use crate::{Completion, NewCompletion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CommitOutcome {
    Created(Completion),
    /// The store already holds a completion for the key.
    AlreadyComplete,
    /// An earlier activity of this pass already claimed the key.
    ClaimedThisPass,
}

/// Run a store call under `timeout`, mapping expiry to [`StoreError::Timeout`].
pub(crate) async fn store_call<T>(
    operation: &'static str,
    timeout: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout { operation, secs: timeout.as_secs() }),
    }
}

pub(crate) struct Committer<'a, S: ?Sized> {
    store: &'a S,
    timeout: Duration,
    dedupe: PassDedupe,
}

impl<'a, S: BoardStore + ?Sized> Committer<'a, S> {
    pub(crate) fn new(store: &'a S, timeout: Duration) -> Self {
        Committer { store, timeout, dedupe: PassDedupe::default() }
    }

    pub(crate) async fn commit(&mut self, completion: NewCompletion) -> Result<CommitOutcome, StoreError> {
        let key = completion.key();
        if !self.dedupe.first_attempt(key) {
            return Ok(CommitOutcome::ClaimedThisPass);
        }

        let result = self.check_then_insert(completion).await;
        if result.is_err() {
            // Let a later activity of the same pass retry the pair.
            self.dedupe.forget(key);
        }
        result
    }

    async fn check_then_insert(&self, completion: NewCompletion) -> Result<CommitOutcome, StoreError> {
        let key = completion.key();
        let existing =
            store_call("get_completion", self.timeout, self.store.get_completion(key.item_id, key.team_id)).await?;
        if existing.is_some() {
            return Ok(CommitOutcome::AlreadyComplete);
        }

        match store_call("create_completion", self.timeout, self.store.create_completion(completion)).await {
            Ok(created) => Ok(CommitOutcome::Created(created)),
            Err(StoreError::Conflict { .. }) => Ok(CommitOutcome::AlreadyComplete),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryBoardStore;
    use crate::{Credit, ItemId, TeamId};

    fn pair(item_id: ItemId, team_id: TeamId) -> NewCompletion {
        NewCompletion {
            item_id,
            team_id,
            credit: Credit::Member(7),
            source_activity_id: Some("a-1".into()),
            evidence: "I found a pair of Dragon Claws".into(),
        }
    }

    #[tokio::test]
    async fn first_commit_creates_then_repeats_are_skipped() {
        let store = InMemoryBoardStore::new();
        let mut committer = Committer::new(&store, Duration::from_secs(1));

        let first = committer.commit(pair(1, 100)).await.unwrap();
        assert!(matches!(first, CommitOutcome::Created(ref c) if c.source_activity_id.as_deref() == Some("a-1")));
        assert_eq!(committer.commit(pair(1, 100)).await.unwrap(), CommitOutcome::ClaimedThisPass);

        let mut next_pass = Committer::new(&store, Duration::from_secs(1));
        assert_eq!(next_pass.commit(pair(1, 100)).await.unwrap(), CommitOutcome::AlreadyComplete);
        assert_eq!(store.completions().await.len(), 1);
    }

    #[tokio::test]
    async fn store_timeout_is_reported() {
        let result: Result<(), StoreError> = store_call("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(StoreError::Timeout { operation: "slow", .. })));
    }
}
