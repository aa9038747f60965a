use alloy::primitives::B256;
use tokio::sync::Mutex;

use crate::domain::tree::CommitmentTree;
use crate::ports::ledger::{
    DepositEvent,
    LedgerError,
    LedgerPort,
};

struct MockLedgerState {
    tree: CommitmentTree,
    events: Vec<DepositEvent>,
    spent_nullifiers: Vec<B256>,
    /// Root history, newest last (bounded like the contract's circular
    /// buffer, but tests never overflow it).
    known_roots: Vec<B256>,
    current_block: u64,
    /// Number of upcoming `get_deposit_events` calls that should fail.
    event_query_failures: u32,
}

/// In-memory ledger for tests and demos: mirrors the mixer contract's
/// observable behavior (sequential leaf indices, root history, spend set)
/// without any RPC.
pub struct MockLedger {
    state: Mutex<MockLedgerState>,
}

impl MockLedger {
    pub fn new(tree_depth: usize) -> Self {
        let tree = CommitmentTree::new(tree_depth).expect("valid mock depth");
        let known_roots = vec![tree.root()];
        Self {
            state: Mutex::new(MockLedgerState {
                tree,
                events: Vec::new(),
                spent_nullifiers: Vec::new(),
                known_roots,
                current_block: 0,
                event_query_failures: 0,
            }),
        }
    }

    /// Simulate a deposit transaction: assigns the next leaf index, advances
    /// one block, and emits a `Deposit` event. Returns the leaf index.
    pub async fn push_deposit(&self, commitment: B256) -> u64 {
        let mut state = self.state.lock().await;
        let leaf_index = state
            .tree
            .append(commitment)
            .expect("mock ledger tree full");
        state.current_block += 1;
        let block_number = state.current_block;
        let root = state.tree.root();
        state.known_roots.push(root);
        state.events.push(DepositEvent {
            commitment,
            leaf_index,
            timestamp: 1_700_000_000 + block_number,
            block_number,
            tx_hash: B256::with_last_byte(leaf_index as u8 + 1),
        });
        leaf_index
    }

    /// Mark a nullifier hash as spent (simulates a processed withdrawal).
    pub async fn mark_spent(&self, nullifier_hash: B256) {
        self.state.lock().await.spent_nullifiers.push(nullifier_hash);
    }

    /// Make the next `n` event queries fail, to exercise the retry path.
    pub async fn fail_next_event_queries(&self, n: u32) {
        self.state.lock().await.event_query_failures = n;
    }

    /// Overwrite the reported root, to simulate divergence from local state.
    pub async fn corrupt_root(&self, root: B256) {
        let mut state = self.state.lock().await;
        state.known_roots.push(root);
    }
}

impl LedgerPort for MockLedger {
    async fn get_deposit_count(&self) -> Result<u64, LedgerError> {
        Ok(self.state.lock().await.events.len() as u64)
    }

    async fn get_last_root(&self) -> Result<B256, LedgerError> {
        let state = self.state.lock().await;
        state
            .known_roots
            .last()
            .copied()
            .ok_or_else(|| LedgerError::InvalidResponse("no roots".into()))
    }

    async fn is_known_root(&self, root: B256) -> Result<bool, LedgerError> {
        Ok(self.state.lock().await.known_roots.contains(&root))
    }

    async fn is_nullifier_spent(&self, nullifier_hash: B256) -> Result<bool, LedgerError> {
        Ok(self
            .state
            .lock()
            .await
            .spent_nullifiers
            .contains(&nullifier_hash))
    }

    async fn current_block(&self) -> Result<u64, LedgerError> {
        Ok(self.state.lock().await.current_block)
    }

    async fn get_deposit_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DepositEvent>, LedgerError> {
        let mut state = self.state.lock().await;
        if state.event_query_failures > 0 {
            state.event_query_failures -= 1;
            return Err(LedgerError::RpcError(
                "injected event query failure".into(),
            ));
        }
        Ok(state
            .events
            .iter()
            .filter(|e| e.block_number >= from_block && e.block_number <= to_block)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequential_indices_and_root_history() {
        let ledger = MockLedger::new(4);
        let empty_root = ledger.get_last_root().await.unwrap();

        assert_eq!(ledger.push_deposit(B256::repeat_byte(0x01)).await, 0);
        assert_eq!(ledger.push_deposit(B256::repeat_byte(0x02)).await, 1);

        assert_eq!(ledger.get_deposit_count().await.unwrap(), 2);
        assert!(ledger.is_known_root(empty_root).await.unwrap());
        assert!(ledger
            .is_known_root(ledger.get_last_root().await.unwrap())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_spend_tracking() {
        let ledger = MockLedger::new(4);
        let nh = B256::repeat_byte(0x09);
        assert!(!ledger.is_nullifier_spent(nh).await.unwrap());
        ledger.mark_spent(nh).await;
        assert!(ledger.is_nullifier_spent(nh).await.unwrap());
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let ledger = MockLedger::new(4);
        ledger.fail_next_event_queries(1).await;
        assert!(ledger.get_deposit_events(0, 10).await.is_err());
        assert!(ledger.get_deposit_events(0, 10).await.is_ok());
    }
}
