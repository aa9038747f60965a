//! Privacy pool core: a commitment/nullifier mixer over an incremental
//! Merkle tree, plus runtime-swappable verification and proof-generation
//! providers.
//!
//! The crate is organized hexagonally:
//! - `domain` holds the pure types (notes, tree, proofs),
//! - `ports` defines the capability traits the core depends on,
//! - `adapters` implements those traits against Ethereum RPC, a remote
//!   verification API, filesystem circuit artifacts, and in-memory mocks,
//! - `pool`, `withdraw`, `verification` and `proving` are the services built
//!   on top, wired together once by `factory`/`context`.

pub mod adapters;
pub mod config;
pub mod context;
pub mod crypto;
pub mod domain;
pub mod factory;
pub mod pool;
pub mod ports;
pub mod proving;
pub mod verification;
pub mod withdraw;
