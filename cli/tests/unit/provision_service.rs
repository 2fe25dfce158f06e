//! Tests for instance provisioning and volume bootstrap.

#![allow(clippy::expect_used)]

use ec2_session::application::ports::TemplateRenderer;
use ec2_session::application::services::location::LocationContext;
use ec2_session::application::services::network::{self, NetworkIdentity};
use ec2_session::application::services::provision::{self, LaunchRequest};
use ec2_session::domain::instance::InstanceKind;
use ec2_session::domain::launch::BootTemplate;
use ec2_session::domain::{Location, SecurityPolicy, Strategy};
use ec2_session::infra::templates::EmbeddedTemplates;

use crate::fake_cloud::{FakeCloud, REGION, SECURITY_GROUP, VPC, ZONE};
use crate::helpers::{RecordingReporter, image, sizing};

fn ctx() -> LocationContext {
    LocationContext::new(Location::new(REGION, ZONE, VPC).expect("location"))
}

async fn identity(cloud: &FakeCloud, ctx: &LocationContext) -> NetworkIdentity {
    network::get_or_create(cloud, ctx, "apps", &SecurityPolicy::new(SECURITY_GROUP))
        .await
        .expect("network identity")
}

#[tokio::test]
async fn preemptible_request_tags_request_and_instance() {
    let cloud = FakeCloud::new();
    let ctx = ctx();
    let network = identity(&cloud, &ctx).await;
    let image = image();
    let payload = EmbeddedTemplates
        .render(BootTemplate::Reference, &[])
        .expect("render");
    let req = LaunchRequest {
        name: "apps",
        image: &image,
        instance_type: "m5.large",
        root_volume_size: 40,
        bid_price: "0.25",
        user_data: &payload,
    };

    let launched = provision::request(&cloud, &ctx, &network, Strategy::Preemptible, &req)
        .await
        .expect("launch");

    let InstanceKind::Preemptible { request_id } = &launched.kind else {
        panic!("expected preemptible kind");
    };
    let calls = cloud.calls();
    let spot = calls
        .iter()
        .find(|op| op.describe() == "ec2 request-spot-instances")
        .expect("request sent");
    assert_eq!(spot.value_of("--spot-price"), Some("0.25"));
    let spec: serde_json::Value =
        serde_json::from_str(spot.value_of("--launch-specification").expect("spec"))
            .expect("json spec");
    assert_eq!(spec["NetworkInterfaces"][0]["NetworkInterfaceId"], network.id.as_str());
    assert_eq!(spec["Placement"]["AvailabilityZone"], ZONE);
    assert_eq!(spec["KeyName"], "ops");

    let tags = calls
        .iter()
        .find(|op| op.describe() == "ec2 create-tags" && op.values_of("--resources").len() == 2)
        .expect("tags sent");
    assert_eq!(
        tags.values_of("--resources"),
        vec![request_id.as_str(), launched.instance_id.as_str()]
    );
    assert!(tags.values_of("--tags").contains(&"Key=request-type,Value=spot"));

    let order: Vec<String> = calls.iter().map(|op| op.describe()).collect();
    let fulfilled = order
        .iter()
        .position(|k| k == "ec2 wait spot-instance-request-fulfilled")
        .expect("fulfilment wait");
    let running = order
        .iter()
        .position(|k| k == "ec2 wait instance-running")
        .expect("running wait");
    assert!(fulfilled < running);
}

#[tokio::test]
async fn unfulfilled_request_is_an_error() {
    let cloud = FakeCloud::new();
    let ctx = ctx();
    let network = identity(&cloud, &ctx).await;
    cloud.fail("ec2 wait spot-instance-request-fulfilled", "WaiterFailure");
    let image = image();
    let payload = EmbeddedTemplates
        .render(BootTemplate::Reference, &[])
        .expect("render");
    let req = LaunchRequest {
        name: "apps",
        image: &image,
        instance_type: "r5.large",
        root_volume_size: 30,
        bid_price: "1",
        user_data: &payload,
    };

    let err = provision::request_preemptible(&cloud, &ctx, &network, &req)
        .await
        .expect_err("never fulfilled");
    assert!(format!("{err:#}").contains("was not fulfilled"));
    assert!(!cloud.called("ec2 describe-spot-instance-requests"));
}

#[tokio::test]
async fn bootstrap_promotes_root_volume_and_terminates() {
    let cloud = FakeCloud::new();
    let ctx = ctx();
    let network = identity(&cloud, &ctx).await;
    let reporter = RecordingReporter::default();
    let (image, sizing) = (image(), sizing());

    let volume = provision::bootstrap_volume(
        &cloud,
        &EmbeddedTemplates,
        &reporter,
        &ctx,
        &network,
        "apps",
        "apps",
        &image,
        &sizing,
    )
    .await
    .expect("bootstrap");

    assert_eq!(volume.name, "apps");
    let keep = cloud
        .calls()
        .into_iter()
        .find(|op| op.describe() == "ec2 modify-instance-attribute")
        .expect("keep root sent");
    let mapping: serde_json::Value =
        serde_json::from_str(keep.value_of("--block-device-mappings").expect("mapping"))
            .expect("json mapping");
    assert_eq!(mapping[0]["Ebs"]["DeleteOnTermination"], false);

    let state = cloud.state();
    assert!(state.live_instances().is_empty());
    let kept = state.volume(&volume.id).expect("root volume kept");
    assert_eq!(kept.name.as_deref(), Some("apps"));
    assert!(kept.attached.is_none());

    // the bootstrap disk is sized for the session volume
    let spot = cloud
        .calls()
        .into_iter()
        .find(|op| op.describe() == "ec2 request-spot-instances")
        .expect("request sent");
    let spec: serde_json::Value =
        serde_json::from_str(spot.value_of("--launch-specification").expect("spec"))
            .expect("json spec");
    assert_eq!(spec["BlockDeviceMappings"][0]["Ebs"]["VolumeSize"], 64);

    let events = reporter.events();
    assert!(events.iter().any(|e| e.starts_with("success: volume ")));
}

#[tokio::test]
async fn bootstrap_terminates_instance_when_root_disk_is_unreadable() {
    let cloud = FakeCloud::new();
    let ctx = ctx();
    let network = identity(&cloud, &ctx).await;
    cloud.fail_once("ec2 describe-instances", "RequestLimitExceeded");
    let reporter = RecordingReporter::default();
    let (image, sizing) = (image(), sizing());

    let err = provision::bootstrap_volume(
        &cloud,
        &EmbeddedTemplates,
        &reporter,
        &ctx,
        &network,
        "apps",
        "apps",
        &image,
        &sizing,
    )
    .await
    .expect_err("root disk lookup fails");

    assert!(format!("{err:#}").contains("failed to read root volume"));
    assert!(cloud.called("ec2 cancel-spot-instance-requests"));
    assert!(cloud.called("ec2 terminate-instances"));
    assert!(!cloud.called("ec2 modify-instance-attribute"));

    let state = cloud.state();
    assert!(state.live_instances().is_empty());
    assert!(state.spot_requests.iter().all(|r| r.cancelled));
}
