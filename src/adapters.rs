pub mod circuit_prover;
pub mod ethereum_rpc;
pub mod mock_ledger;
pub mod mock_prover;
pub mod remote_verification;
pub mod static_verification;
