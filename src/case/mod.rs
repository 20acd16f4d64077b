//! Persistence boundary and batch execution over many accounts.
//!
//! The core never loads or stores anything itself: a [`CaseRepository`]
//! hands it immutable inputs and receives immutable outcomes.
//!
//! [`CaseRepository`]: repository::CaseRepository

pub mod repository;
pub mod runner;
