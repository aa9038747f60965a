use alloy::primitives::B256;
use thiserror::Error;

use crate::domain::{
    merkle::MerkleProof,
    note::DepositNote,
    tree::{
        CommitmentTree,
        TreeError,
        DEFAULT_TREE_DEPTH,
    },
};
use crate::ports::ledger::{
    DepositEvent,
    LedgerError,
    LedgerPort,
};

/// Maximum block range per log query during reconciliation (RPC providers
/// cap log queries).
pub const RECONCILE_BATCH_BLOCKS: u64 = 500;

/// Narrowest range a failed batch is retried at before reconciliation is
/// abandoned.
const MIN_BATCH_BLOCKS: u64 = 25;

/// Errors from pool operations.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("reconciliation aborted: {0}")]
    Ledger(#[from] LedgerError),
}

/// Outcome of a reconciliation pass. A root mismatch is reported here (and
/// warned about), never raised as an error: the pool keeps operating on a
/// best-effort tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Deposit count the ledger claimed.
    pub expected_events: u64,
    /// Events actually collected from the scanned history.
    pub collected_events: u64,
    /// Root of the rebuilt local tree.
    pub local_root: B256,
    /// Root the ledger reported.
    pub ledger_root: B256,
    /// Whether the two agree.
    pub in_sync: bool,
}

/// The commitment pool: an append-only Merkle tree of deposit commitments
/// kept consistent with the external mixer ledger.
///
/// All mutation happens through sequential calls from the event-ingestion
/// path; callers must not run `record_deposit` and `reconcile` concurrently
/// against the same pool (at most one in-flight reconciliation per pool).
#[derive(Debug)]
pub struct CommitmentPool {
    tree: CommitmentTree,
    /// Block below which no deposits exist; bounds backward scans.
    deployment_block: u64,
}

impl CommitmentPool {
    pub fn new(tree_depth: usize, deployment_block: u64) -> Result<Self, PoolError> {
        Ok(Self {
            tree: CommitmentTree::new(tree_depth)?,
            deployment_block,
        })
    }

    pub fn with_default_depth(deployment_block: u64) -> Result<Self, PoolError> {
        Self::new(DEFAULT_TREE_DEPTH, deployment_block)
    }

    /// Draw a fresh deposit note. Randomness is never reused across notes;
    /// each call draws two independent field elements.
    pub fn generate_note(&self) -> DepositNote {
        DepositNote::generate()
    }

    pub fn tree_depth(&self) -> usize {
        self.tree.depth()
    }

    pub fn leaf_count(&self) -> usize {
        self.tree.len()
    }

    pub fn leaf(&self, index: u64) -> B256 {
        self.tree.leaf(index)
    }

    /// Record a confirmed deposit at its ledger-assigned index. Idempotent:
    /// re-recording the same leaf overwrites in place, and intermediate
    /// unfilled leaves are padded with the empty-leaf value. Indices are
    /// never compacted or reused.
    pub fn record_deposit(
        &mut self,
        commitment: B256,
        leaf_index: u64,
        tx_hash: B256,
    ) -> Result<(), PoolError> {
        self.tree.set_leaf(leaf_index, commitment)?;
        tracing::debug!(
            leaf_index,
            %commitment,
            %tx_hash,
            "recorded deposit commitment"
        );
        Ok(())
    }

    /// Recompute the current root. Pure and side-effect-free.
    pub fn root(&self) -> B256 {
        self.tree.root()
    }

    /// Merkle proof for a recorded leaf, generated fresh on every call.
    pub fn proof(&self, leaf_index: u64) -> Result<MerkleProof, PoolError> {
        Ok(self.tree.proof(leaf_index)?)
    }

    /// Rebuild the local tree from the ledger's event history and compare
    /// roots.
    ///
    /// Events are fetched in bounded batches walking backward from the
    /// current block until the expected count is collected or history is
    /// exhausted. A failed batch is retried with a halved range; only when
    /// the range can shrink no further does the whole pass abort, leaving
    /// the prior tree (and every deposit recorded before the failure)
    /// untouched.
    pub async fn reconcile<L: LedgerPort>(
        &mut self,
        ledger: &L,
    ) -> Result<ReconcileReport, PoolError> {
        let expected = ledger.get_deposit_count().await?;
        let head = ledger.current_block().await?;

        let mut events: Vec<DepositEvent> = Vec::with_capacity(expected as usize);
        let mut to_block = head;
        let mut batch = RECONCILE_BATCH_BLOCKS;

        while (events.len() as u64) < expected {
            let from_block = to_block
                .saturating_sub(batch - 1)
                .max(self.deployment_block);

            match ledger.get_deposit_events(from_block, to_block).await {
                Ok(found) => {
                    events.extend(found);
                    if from_block <= self.deployment_block {
                        break;
                    }
                    to_block = from_block - 1;
                    batch = RECONCILE_BATCH_BLOCKS;
                }
                Err(err) if batch > MIN_BATCH_BLOCKS => {
                    batch /= 2;
                    tracing::warn!(
                        from_block,
                        to_block,
                        retry_batch = batch,
                        "deposit event query failed, retrying narrower range: {err}"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        from_block,
                        to_block,
                        "deposit event query failed at minimum range, aborting \
                         reconciliation: {err}"
                    );
                    return Err(err.into());
                }
            }
        }

        if (events.len() as u64) < expected {
            tracing::warn!(
                expected,
                collected = events.len(),
                "ledger history exhausted before all deposit events were found"
            );
        }

        // Batches arrive newest-first; leaf order is what matters.
        events.sort_by_key(|e| e.leaf_index);
        events.dedup_by_key(|e| e.leaf_index);

        let mut rebuilt = CommitmentTree::new(self.tree.depth())?;
        for event in &events {
            rebuilt.set_leaf(event.leaf_index, event.commitment)?;
        }

        let local_root = rebuilt.root();
        let ledger_root = ledger.get_last_root().await?;
        let in_sync = local_root == ledger_root;

        if in_sync {
            tracing::info!(%local_root, events = events.len(), "pool reconciled with ledger");
        } else {
            tracing::warn!(
                %local_root,
                %ledger_root,
                events = events.len(),
                "reconciled root does not match ledger root, keeping best-effort tree"
            );
        }

        // Collection succeeded, so the rebuilt tree replaces local state
        // even on a root mismatch.
        self.tree = rebuilt;

        Ok(ReconcileReport {
            expected_events: expected,
            collected_events: events.len() as u64,
            local_root,
            ledger_root,
            in_sync,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock_ledger::MockLedger;
    use crate::domain::tree::zero_leaf;

    #[test]
    fn test_record_deposit_idempotent() {
        let mut pool = CommitmentPool::new(6, 0).unwrap();
        let commitment = B256::repeat_byte(0x05);
        pool.record_deposit(commitment, 2, B256::ZERO).unwrap();
        let root = pool.root();

        pool.record_deposit(commitment, 2, B256::ZERO).unwrap();
        assert_eq!(pool.root(), root);
        assert_eq!(pool.leaf(0), zero_leaf());
        assert_eq!(pool.leaf(2), commitment);
    }

    #[test]
    fn test_proof_tracks_latest_state() {
        let mut pool = CommitmentPool::new(6, 0).unwrap();
        pool.record_deposit(B256::repeat_byte(0x01), 0, B256::ZERO)
            .unwrap();
        let before = pool.proof(0).unwrap();

        pool.record_deposit(B256::repeat_byte(0x02), 1, B256::ZERO)
            .unwrap();
        let after = pool.proof(0).unwrap();

        assert_ne!(before.root, after.root);
        assert_eq!(after.root, pool.root());
    }

    #[tokio::test]
    async fn test_reconcile_rebuilds_from_events() {
        let ledger = MockLedger::new(6);
        let c0 = B256::repeat_byte(0xa0);
        let c1 = B256::repeat_byte(0xa1);
        ledger.push_deposit(c0).await;
        ledger.push_deposit(c1).await;

        let mut pool = CommitmentPool::new(6, 0).unwrap();
        let report = pool.reconcile(&ledger).await.unwrap();

        assert_eq!(report.expected_events, 2);
        assert_eq!(report.collected_events, 2);
        assert!(report.in_sync);
        assert_eq!(pool.leaf(0), c0);
        assert_eq!(pool.leaf(1), c1);
        assert_eq!(pool.root(), report.local_root);
    }

    #[tokio::test]
    async fn test_reconcile_batch_failure_retries_narrower() {
        let ledger = MockLedger::new(6);
        ledger.push_deposit(B256::repeat_byte(0xb0)).await;
        // First query fails; the pool must halve the range and carry on.
        ledger.fail_next_event_queries(1).await;

        let mut pool = CommitmentPool::new(6, 0).unwrap();
        let report = pool.reconcile(&ledger).await.unwrap();
        assert_eq!(report.collected_events, 1);
        assert!(report.in_sync);
    }

    #[tokio::test]
    async fn test_reconcile_total_failure_keeps_prior_tree() {
        let ledger = MockLedger::new(6);
        ledger.push_deposit(B256::repeat_byte(0xc0)).await;
        // Enough consecutive failures to exhaust the range-halving retries.
        ledger.fail_next_event_queries(16).await;

        let mut pool = CommitmentPool::new(6, 0).unwrap();
        pool.record_deposit(B256::repeat_byte(0x77), 0, B256::ZERO)
            .unwrap();
        let prior_root = pool.root();

        let err = pool.reconcile(&ledger).await;
        assert!(err.is_err());
        assert_eq!(pool.root(), prior_root, "prior state must survive");
    }
}
