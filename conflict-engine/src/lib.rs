//! # conflict-engine
//!
//! Collapses git conflict-marker blocks left behind by a failed merge.
//!
//! A block looks like this (the `|||||||` base section only appears with
//! `merge.conflictStyle = diff3`):
//!
//! ```text
//! <<<<<<< HEAD
//! our lines
//! ||||||| base
//! base lines
//! =======
//! their lines
//! >>>>>>> feature
//! ```
//!
//! [`resolve`] keeps one side of every block according to a [`Strategy`],
//! [`scan`] reports where the blocks are, and [`preview`] renders the
//! resolution as a unified diff before it is applied.
//!
//! ## Example
//!
//! ```rust
//! use conflict_engine::{resolve, Strategy};
//!
//! let merged = "a\n<<<<<<< HEAD\nmine\n=======\nyours\n>>>>>>> topic\nz";
//! assert_eq!(resolve(merged, Strategy::Theirs), "a\nyours\nz");
//! ```

pub mod parser;
pub mod preview;
pub mod resolver;
pub mod types;

pub use preview::preview;
pub use resolver::{has_conflicts, resolve, scan};
pub use types::{ConflictRegion, ParseStrategyError, Strategy};
