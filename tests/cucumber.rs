//! Cucumber test runner for behavioural tests.
//!
//! Runs two suites against in-memory connections:
//! - `BridgeWorld`: request dispatch and outbound calls
//! - `PolicyWorld`: what happens when a second connection arrives
//!
//! ```text
//! tests/features/bridge.feature             -> BridgeWorld context
//! tests/features/connection_policy.feature  -> PolicyWorld context
//! ```

mod steps;

use cucumber::World;
use world::{BridgeWorld, PolicyWorld};

#[tokio::main]
async fn main() {
    BridgeWorld::run("tests/features/bridge.feature").await;
    PolicyWorld::run("tests/features/connection_policy.feature").await;
}
