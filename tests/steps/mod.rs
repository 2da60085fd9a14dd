//! Step definitions for the behavioural tests.

mod bridge_steps;
mod policy_steps;
