//! teamtree: multiplier/follower referral hierarchies
//!
//! Builds a forest of multipliers from a flat participant list, attaches
//! followers to their leaders and lays the result out as a positioned
//! node/edge graph under a synthetic campaign root.
//!
//! Layers, innermost first: [`domain`] (pure model and algorithms),
//! [`application`] (services), [`infrastructure`] (I/O and wiring),
//! [`cli`] (argument parsing and output).

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
