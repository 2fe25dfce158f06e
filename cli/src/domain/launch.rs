//! Launch specification documents and boot payloads.

use serde_json::{Value, json};

/// Root device of the supported machine images.
pub const ROOT_DEVICE: &str = "/dev/sda1";

/// Boot script variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootTemplate {
    /// No-op placeholder used by the bootstrap instance.
    Reference,
    /// Attach and mount the persistent volume.
    Remount,
    /// Inject credentials, remount, then run the user script.
    Chainload,
}

impl BootTemplate {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Reference => "user-data-reference.sh.tpl",
            Self::Remount => "user-data-remount.sh.tpl",
            Self::Chainload => "user-data-chainload.sh.tpl",
        }
    }
}

/// Base64-encoded boot script, free of line breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootPayload(String);

impl BootPayload {
    /// Wrap an already encoded payload, stripping line breaks.
    #[must_use]
    pub fn from_encoded(encoded: &str) -> Self {
        Self(encoded.chars().filter(|c| !matches!(c, '\n' | '\r')).collect())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Inputs of a launch specification.
#[derive(Debug, Clone)]
pub struct LaunchSpec<'a> {
    pub ami_id: &'a str,
    pub instance_type: &'a str,
    pub key_name: &'a str,
    pub zone: &'a str,
    pub instance_role: &'a str,
    pub root_volume_size: u32,
    pub network_interface_id: &'a str,
    pub user_data: &'a BootPayload,
}

impl LaunchSpec<'_> {
    /// Launch document, used both as a spot launch specification and as
    /// launch template data.
    #[must_use]
    pub fn document(&self) -> Value {
        let mut doc = json!({
            "ImageId": self.ami_id,
            "InstanceType": self.instance_type,
            "KeyName": self.key_name,
            "UserData": self.user_data.as_str(),
            "BlockDeviceMappings": [{
                "DeviceName": ROOT_DEVICE,
                "Ebs": {
                    "VolumeSize": self.root_volume_size,
                    "VolumeType": "gp3",
                    "DeleteOnTermination": true
                }
            }],
            "NetworkInterfaces": [{
                "DeviceIndex": 0,
                "NetworkInterfaceId": self.network_interface_id
            }],
            "Placement": { "AvailabilityZone": self.zone }
        });
        if !self.instance_role.is_empty() {
            doc["IamInstanceProfile"] = instance_profile(self.instance_role);
        }
        doc
    }
}

/// Instance profile reference: an ARN when given one, a profile name otherwise.
fn instance_profile(role: &str) -> Value {
    if role.starts_with("arn:") {
        json!({ "Arn": role })
    } else {
        json!({ "Name": role })
    }
}

/// Block device mapping that keeps the root volume after termination.
#[must_use]
pub fn keep_root_volume_mapping() -> String {
    json!([{ "DeviceName": ROOT_DEVICE, "Ebs": { "DeleteOnTermination": false } }]).to_string()
}
