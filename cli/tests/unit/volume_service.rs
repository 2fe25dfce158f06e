//! Tests for volume lookups and stale-attachment recovery.

#![allow(clippy::expect_used)]

use ec2_session::application::services::location::LocationContext;
use ec2_session::application::services::volume;
use ec2_session::domain::Location;

use crate::fake_cloud::{FakeCloud, REGION, VPC, ZONE};

fn ctx() -> LocationContext {
    LocationContext::new(Location::new(REGION, ZONE, VPC).expect("location"))
}

#[tokio::test]
async fn get_finds_volume_by_name_in_zone() {
    let cloud = FakeCloud::new();
    let id = cloud.add_volume("apps");
    cloud.add_volume("other");

    let found = volume::get(&cloud, &ctx(), "apps")
        .await
        .expect("lookup")
        .expect("volume present");
    assert_eq!(found.id, id);
    assert_eq!(found.name, "apps");
    assert_eq!(found.region, REGION);

    assert!(volume::get(&cloud, &ctx(), "missing").await.expect("lookup").is_none());
}

#[tokio::test]
async fn get_ignores_volumes_in_other_zones() {
    let cloud = FakeCloud::new();
    let id = cloud.add_volume("apps");
    cloud
        .state()
        .volumes
        .iter_mut()
        .filter(|v| v.id == id)
        .for_each(|v| v.zone = "eu-west-2b".to_string());

    assert!(volume::get(&cloud, &ctx(), "apps").await.expect("lookup").is_none());
}

#[tokio::test]
async fn get_propagates_rejected_lookup() {
    let cloud = FakeCloud::new();
    cloud.fail("ec2 describe-volumes", "UnauthorizedOperation");

    let err = volume::get(&cloud, &ctx(), "apps").await.expect_err("rejected");
    assert!(format!("{err:#}").contains("failed to look up volume"));
}

#[tokio::test]
async fn unattached_volume_is_not_detached() {
    let cloud = FakeCloud::new();
    cloud.add_volume("apps");
    let vol = volume::get(&cloud, &ctx(), "apps").await.expect("lookup").expect("present");

    assert_eq!(vol.attached_instance_id(&cloud).await.expect("attachment"), None);
    assert!(!vol.force_detach_if_stale(&cloud).await.expect("check"));
    assert!(!cloud.called("ec2 detach-volume"));
}

#[tokio::test]
async fn volume_of_live_instance_is_not_detached() {
    let cloud = FakeCloud::new();
    let id = cloud.add_volume("apps");
    let owner = cloud.add_instance("apps", &id, false);
    let vol = volume::get(&cloud, &ctx(), "apps").await.expect("lookup").expect("present");

    assert_eq!(
        vol.attached_instance_id(&cloud).await.expect("attachment"),
        Some(owner)
    );
    assert!(!vol.force_detach_if_stale(&cloud).await.expect("check"));
    assert!(cloud.mutations().is_empty());
}

#[tokio::test]
async fn volume_of_stopped_instance_is_detached() {
    let cloud = FakeCloud::new();
    let id = cloud.add_volume("apps");
    let owner = cloud.add_instance("apps", &id, false);
    cloud.set_instance_state(&owner, "stopped");
    let vol = volume::get(&cloud, &ctx(), "apps").await.expect("lookup").expect("present");

    assert!(vol.force_detach_if_stale(&cloud).await.expect("detach"));
    assert_eq!(cloud.mutations(), vec!["ec2 detach-volume"]);
    assert!(cloud.called("ec2 wait volume-available"));
    assert!(cloud.state().volume(&id).expect("volume").attached.is_none());
}

#[tokio::test]
async fn rejected_owner_lookup_is_an_error() {
    let cloud = FakeCloud::new();
    let id = cloud.add_volume("apps");
    cloud.add_instance("apps", &id, false);
    cloud.fail("ec2 describe-instances", "UnauthorizedOperation");
    let vol = volume::get(&cloud, &ctx(), "apps").await.expect("lookup").expect("present");

    let err = vol.force_detach_if_stale(&cloud).await.expect_err("rejected");
    assert!(format!("{err:#}").contains("failed to read state of volume owner"));
    assert!(!cloud.called("ec2 detach-volume"));
}
