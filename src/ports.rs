pub mod ledger;
pub mod prover;
pub mod verification;
