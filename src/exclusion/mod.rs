//! Exclusion of previously designated records before a selection pass.
//!
//! ```text
//!  RawExclusion (explicit ids, upstream selections)
//!        │  union
//!        ▼
//!  ExclusionSet ── filter_flat ──▶ reduced sequence ──▶ strategy
//!        │                                                 │
//!        └──────────── shift_per_key ◀──── reduced ids ────┘
//! ```

mod raw;
mod set;

pub use raw::RawExclusion;
pub use set::{Canonicalized, ExclusionSet};
