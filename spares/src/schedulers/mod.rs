//! Scheduling (`spec.md` §4.5-§4.9). The legacy algorithm ("SM-2 variant")
//! is the only scheduler this crate implements — the intervals, eases,
//! and thresholds are fixed for compatibility with existing user data
//! (`spec.md` §1), so unlike a pluggable-scheduler registry, there is
//! nothing here to register or select by name.

pub mod sm2;

/// Button count for a card currently in the Learning/DayLearning queue:
/// `Again=1, Good=2, Easy=3` (`spec.md` §4.6.1).
pub const LEARNING_BUTTON_COUNT: u32 = 3;

/// Button count for a card in the Review queue: `Again=1, Hard=2, Good=3,
/// Easy=4` (`spec.md` §4.6.2, §6 constants).
pub const REVIEW_BUTTON_COUNT: u32 = 4;
