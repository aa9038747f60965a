use alloy::primitives::B256;
use thiserror::Error;

/// One `Deposit` event as emitted by the mixer contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositEvent {
    pub commitment: B256,
    /// Ledger-assigned position; strictly reflects deposit order.
    pub leaf_index: u64,
    /// Block timestamp of the deposit.
    pub timestamp: u64,
    pub block_number: u64,
    pub tx_hash: B256,
}

/// Errors from ledger queries.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("contract error: {0}")]
    ContractError(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timeout waiting for ledger")]
    Timeout,
}

/// Read/query surface of the external mixer ledger.
///
/// The ledger is the sole authority on deposit count, leaf indices, root
/// history and spend status. This core never signs or broadcasts; writes are
/// constructed as calldata by the Ethereum adapter and handed to the caller.
pub trait LedgerPort: Send + Sync {
    /// Total number of deposits recorded on the ledger.
    fn get_deposit_count(
        &self,
    ) -> impl core::future::Future<Output = Result<u64, LedgerError>>;

    /// The ledger's current Merkle root.
    fn get_last_root(
        &self,
    ) -> impl core::future::Future<Output = Result<B256, LedgerError>>;

    /// Whether a root is still inside the ledger's bounded root history.
    fn is_known_root(
        &self,
        root: B256,
    ) -> impl core::future::Future<Output = Result<bool, LedgerError>>;

    /// Whether a nullifier hash has already been spent.
    fn is_nullifier_spent(
        &self,
        nullifier_hash: B256,
    ) -> impl core::future::Future<Output = Result<bool, LedgerError>>;

    /// Latest block number, the starting point for backward event scans.
    fn current_block(
        &self,
    ) -> impl core::future::Future<Output = Result<u64, LedgerError>>;

    /// `Deposit` events in an inclusive block range. Callers keep ranges
    /// bounded; RPC providers reject wide log queries.
    fn get_deposit_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> impl core::future::Future<Output = Result<Vec<DepositEvent>, LedgerError>>;
}
