//! Sequence variant related commands.

pub mod pass_filter;
pub mod summarise;
