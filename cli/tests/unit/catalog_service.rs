//! Tests for instance type catalog lookups.

#![allow(clippy::expect_used)]

use ec2_session::application::services::catalog;
use ec2_session::domain::SessionError;

use crate::fake_cloud::{FakeCloud, REGION, ZONE};

#[tokio::test]
async fn system_info_of_known_type() {
    let cloud = FakeCloud::new();
    let info = catalog::system_info(&cloud, REGION, "g4dn.xlarge")
        .await
        .expect("known type");

    assert_eq!(info.instance_type, "g4dn.xlarge");
    assert_eq!(info.vcpus, 4);
    let lines = info.lines();
    assert!(lines.contains(&("GPUs", "1 x T4".to_string())));
    assert!(lines.contains(&("GPU Memory", "15360 MiB".to_string())));
}

#[tokio::test]
async fn unknown_type_is_not_found() {
    let cloud = FakeCloud::new();
    let err = catalog::system_info(&cloud, REGION, "x9.huge")
        .await
        .expect_err("unknown type");

    assert_eq!(
        err.downcast_ref::<SessionError>(),
        Some(&SessionError::InstanceTypeNotFound {
            instance_type: "x9.huge".to_string(),
            region: REGION.to_string(),
        })
    );
}

#[tokio::test]
async fn offerings_are_sorted_and_unique() {
    let cloud = FakeCloud::new();
    let types = catalog::offerings(&cloud, REGION, ZONE).await.expect("offerings");
    assert_eq!(types, vec!["g4dn.xlarge", "m5.large", "r5.large"]);

    let op = cloud.calls().pop().expect("call recorded");
    assert_eq!(op.value_of("--location-type"), Some("availability-zone"));
}

#[tokio::test]
async fn empty_zone_has_no_offerings() {
    let cloud = FakeCloud::new();
    let err = catalog::offerings(&cloud, REGION, "eu-west-2c")
        .await
        .expect_err("nothing offered");
    assert_eq!(
        err.downcast_ref::<SessionError>(),
        Some(&SessionError::NoOfferings("eu-west-2c".to_string()))
    );
}
