//! The legacy SM-2 scheduler (`spec.md` §4.5-§4.9): queue assembly, answer
//! processing, sibling burying, filtered decks, and leech detection.
//! Unlike a pluggable-scheduler design, there is exactly one algorithm
//! here, matching the fixed-intervals-for-compatibility mandate in
//! `spec.md` §1.

pub mod answer;
pub mod filtered;
pub mod interval;
pub mod leech;
pub mod queues;

pub use answer::answer_card;
pub use queues::Session;
