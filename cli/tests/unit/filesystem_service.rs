//! Tests for shared filesystem lookup and creation.

#![allow(clippy::expect_used)]

use std::time::Duration;

use ec2_session::application::services::filesystem::{self, Acquired};
use ec2_session::application::services::location::LocationContext;
use ec2_session::domain::Location;
use ec2_session::domain::filesystem::LIFECYCLE_POLICY;

use crate::fake_cloud::{FakeCloud, REGION, VPC, ZONE};
use crate::helpers::{NoPrompt, NoopReporter, ScriptedPrompt};

fn ctx() -> LocationContext {
    LocationContext::new(Location::new(REGION, ZONE, VPC).expect("location"))
}

#[tokio::test]
async fn missing_filesystem_is_none() {
    let cloud = FakeCloud::new();
    assert!(filesystem::get(&cloud, &ctx(), "shared").await.expect("lookup").is_none());
}

#[tokio::test]
async fn create_polls_until_available_then_sets_lifecycle_once() {
    let cloud = FakeCloud::new();
    cloud.state().creation_polls = 3;

    let fs = filesystem::create_polling(&cloud, &ctx(), "shared", Duration::ZERO)
        .await
        .expect("create");

    assert_eq!(fs.name, "shared");
    // three answers of `creating`, one of `available`
    assert_eq!(cloud.count("efs describe-file-systems"), 4);
    assert_eq!(cloud.count("efs put-lifecycle-configuration"), 1);

    let create = cloud
        .calls()
        .into_iter()
        .find(|op| op.describe() == "efs create-file-system")
        .expect("create sent");
    assert!(create.has_switch("--encrypted"));
    assert_eq!(create.value_of("--creation-token"), Some("shared"));

    let state = cloud.state();
    assert_eq!(state.filesystems[0].id, fs.id);
    assert_eq!(state.filesystems[0].lifecycle_policies, vec![LIFECYCLE_POLICY]);
}

#[tokio::test]
async fn get_or_create_reuses_existing_filesystem() {
    let cloud = FakeCloud::new();
    cloud.state().creation_polls = 0;
    let prompt = ScriptedPrompt::yes();

    let first = filesystem::get_or_create(&cloud, &prompt, &NoopReporter, &ctx(), "shared")
        .await
        .expect("create");
    let Acquired::Created(first) = first else {
        panic!("expected Created");
    };
    let second = filesystem::get_or_create(&cloud, &NoPrompt, &NoopReporter, &ctx(), "shared")
        .await
        .expect("reuse");

    assert_eq!(second, Acquired::Existing(first));
    assert_eq!(prompt.asked().len(), 1);
    assert_eq!(cloud.count("efs create-file-system"), 1);
}

#[tokio::test]
async fn declined_creation_creates_nothing() {
    let cloud = FakeCloud::new();
    let prompt = ScriptedPrompt::no();

    let acquired = filesystem::get_or_create(&cloud, &prompt, &NoopReporter, &ctx(), "shared")
        .await
        .expect("lookup");

    assert_eq!(acquired, Acquired::Declined);
    assert_eq!(
        prompt.asked(),
        vec![format!("Filesystem shared not found in {}. Create one?", ctx().location())]
    );
    assert!(!cloud.called("efs create-file-system"));
}

#[tokio::test]
async fn rejected_lifecycle_policy_fails_creation() {
    let cloud = FakeCloud::new();
    cloud.state().creation_polls = 0;
    cloud.fail("efs put-lifecycle-configuration", "BadRequest");

    let err = filesystem::create_polling(&cloud, &ctx(), "shared", Duration::ZERO)
        .await
        .expect_err("rejected");
    assert!(format!("{err:#}").contains("failed to configure filesystem lifecycle"));
}
