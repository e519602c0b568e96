//! Wire and domain types shared between the town client and its tooling.

pub mod domain;
pub mod error;
pub mod protocol;
