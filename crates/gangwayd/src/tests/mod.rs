//! Behavioural tests exercising the daemon end to end.

mod bridge_behaviour;
pub(crate) mod support;
