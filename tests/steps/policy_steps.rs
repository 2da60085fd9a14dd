//! Steps for connection policy scenarios.
use cucumber::{given, then, when};
use wirebridge::ConnectionPolicy;

use crate::world::PolicyWorld;

fn policy(name: &str) -> ConnectionPolicy {
    match name {
        "replace" => ConnectionPolicy::Replace,
        "reject" => ConnectionPolicy::Reject,
        other => panic!("unknown policy: {other}"),
    }
}

#[given(expr = "a bridge using the {word} policy with one connected host")]
async fn given_policy(world: &mut PolicyWorld, name: String) { world.start(policy(&name)).await; }

#[when("a second host connects")]
async fn when_second_connects(world: &mut PolicyWorld) { world.connect_second().await; }

#[then(expr = "the second host is closed with code {int}")]
async fn then_second_closed(world: &mut PolicyWorld, code: u16) {
    assert_eq!(world.second_close_code().await, Some(code));
    assert!(world.second_was_rejected().await);
}

#[then(expr = "outbound calls go to the {word} host")]
async fn then_outbound_recipient(world: &mut PolicyWorld, which: String) {
    assert_eq!(world.outbound_recipient().await, which.as_str());
}
