pub mod merkle;
pub mod note;
pub mod proof;
pub mod tree;
pub mod verification;
pub mod zkproof;
