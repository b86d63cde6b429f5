// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Block storage: volumes, boot volumes, and their attachments to instances

use crate::enums::EncryptionInTransitType;
use crate::enums::VolumeAttachmentLifecycleState;
use crate::enums::VolumeLifecycleState;
use crate::envelope::NoCommonFields;
use crate::polymorphic_family;
use chrono::DateTime;
use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

/*
 * VOLUME SOURCES
 */

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct VolumeSourceFromVolumeDetails {
    #[serde(flatten)]
    pub base: NoCommonFields,
    /// id of the volume to clone
    pub id: String,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct VolumeSourceFromVolumeBackupDetails {
    #[serde(flatten)]
    pub base: NoCommonFields,
    /// id of the backup to restore
    pub id: String,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct VolumeSourceFromBlockVolumeReplicaDetails {
    #[serde(flatten)]
    pub base: NoCommonFields,
    /// id of the cross-region replica to activate
    pub id: String,
}

polymorphic_family! {
    /// Where a new volume's initial contents come from
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum VolumeSourceDetails {
        discriminator = "type",
        base = NoCommonFields,
        variants = {
            "volume" => Volume(VolumeSourceFromVolumeDetails),
            "volumeBackup" => VolumeBackup(VolumeSourceFromVolumeBackupDetails),
            "blockVolumeReplica" =>
                BlockVolumeReplica(VolumeSourceFromBlockVolumeReplicaDetails),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct BootVolumeSourceFromBootVolumeDetails {
    #[serde(flatten)]
    pub base: NoCommonFields,
    pub id: String,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct BootVolumeSourceFromBootVolumeBackupDetails {
    #[serde(flatten)]
    pub base: NoCommonFields,
    pub id: String,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct BootVolumeSourceFromBootVolumeReplicaDetails {
    #[serde(flatten)]
    pub base: NoCommonFields,
    pub id: String,
}

polymorphic_family! {
    /// Where a new boot volume's initial contents come from
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum BootVolumeSourceDetails {
        discriminator = "type",
        base = NoCommonFields,
        variants = {
            "bootVolume" => BootVolume(BootVolumeSourceFromBootVolumeDetails),
            "bootVolumeBackup" =>
                BootVolumeBackup(BootVolumeSourceFromBootVolumeBackupDetails),
            "bootVolumeReplica" =>
                BootVolumeReplica(BootVolumeSourceFromBootVolumeReplicaDetails),
        }
    }
}

/*
 * VOLUMES
 */

/// Create-time parameters for a [`Volume`]
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVolumeDetails {
    pub compartment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(rename = "sizeInGBs", skip_serializing_if = "Option::is_none")]
    pub size_in_gbs: Option<i64>,
    #[serde(rename = "vpusPerGB", skip_serializing_if = "Option::is_none")]
    pub vpus_per_gb: Option<i64>,
    /// If absent, the volume is created empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_details: Option<VolumeSourceDetails>,
}

/// Client view of a block volume
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: String,
    pub availability_domain: String,
    pub compartment_id: String,
    pub display_name: String,
    pub lifecycle_state: VolumeLifecycleState,
    #[serde(rename = "sizeInMBs")]
    pub size_in_mbs: i64,
    pub time_created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_hydrated: Option<bool>,
    #[serde(rename = "sizeInGBs", skip_serializing_if = "Option::is_none")]
    pub size_in_gbs: Option<i64>,
    #[serde(rename = "vpusPerGB", skip_serializing_if = "Option::is_none")]
    pub vpus_per_gb: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_details: Option<VolumeSourceDetails>,
}

/// Create-time parameters for a boot volume
///
/// Unlike block volumes, a boot volume always has a source.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBootVolumeDetails {
    pub compartment_id: String,
    pub source_details: BootVolumeSourceDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(rename = "sizeInGBs", skip_serializing_if = "Option::is_none")]
    pub size_in_gbs: Option<i64>,
    #[serde(rename = "vpusPerGB", skip_serializing_if = "Option::is_none")]
    pub vpus_per_gb: Option<i64>,
}

/*
 * ATTACHING VOLUMES
 */

/// Fields shared by every kind of [`AttachVolumeDetails`]
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachVolumeBase {
    pub instance_id: String,
    pub volume_id: String,
    /// Device path the volume should appear at inside the guest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_shareable: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachIScsiVolumeDetails {
    #[serde(flatten)]
    pub base: AttachVolumeBase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_chap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_in_transit_type: Option<EncryptionInTransitType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_agent_auto_iscsi_login_enabled: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachParavirtualizedVolumeDetails {
    #[serde(flatten)]
    pub base: AttachVolumeBase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pv_encryption_in_transit_enabled: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct AttachEmulatedVolumeDetails {
    #[serde(flatten)]
    pub base: AttachVolumeBase,
}

/// Let the service pick the attachment type that suits the instance's shape
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct AttachServiceDeterminedVolumeDetails {
    #[serde(flatten)]
    pub base: AttachVolumeBase,
}

polymorphic_family! {
    /// Parameters for attaching a volume to an instance
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum AttachVolumeDetails {
        discriminator = "type",
        base = AttachVolumeBase,
        variants = {
            "iscsi" => IScsi(AttachIScsiVolumeDetails),
            "paravirtualized" =>
                Paravirtualized(AttachParavirtualizedVolumeDetails),
            "emulated" => Emulated(AttachEmulatedVolumeDetails),
            "service_determined" =>
                ServiceDetermined(AttachServiceDeterminedVolumeDetails),
        }
    }
}

/// Fields shared by every kind of [`VolumeAttachment`]
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeAttachmentBase {
    pub id: String,
    pub availability_domain: String,
    pub compartment_id: String,
    pub instance_id: String,
    pub lifecycle_state: VolumeAttachmentLifecycleState,
    pub time_created: DateTime<Utc>,
    pub volume_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_multipath: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pv_encryption_in_transit_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_shareable: Option<bool>,
}

/// An iSCSI attachment: the guest must log in to the target itself unless
/// the agent does it
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IScsiVolumeAttachment {
    #[serde(flatten)]
    pub base: VolumeAttachmentBase,
    pub ipv4: String,
    pub iqn: String,
    pub port: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chap_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chap_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_in_transit_type: Option<EncryptionInTransitType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_agent_auto_iscsi_login_enabled: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct ParavirtualizedVolumeAttachment {
    #[serde(flatten)]
    pub base: VolumeAttachmentBase,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct EmulatedVolumeAttachment {
    #[serde(flatten)]
    pub base: VolumeAttachmentBase,
}

polymorphic_family! {
    /// Client view of a volume's attachment to an instance
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum VolumeAttachment {
        discriminator = "attachmentType",
        base = VolumeAttachmentBase,
        variants = {
            "iscsi" => IScsi(IScsiVolumeAttachment),
            "paravirtualized" =>
                Paravirtualized(ParavirtualizedVolumeAttachment),
            "emulated" => Emulated(EmulatedVolumeAttachment),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::envelope::DecodeError;
    use crate::envelope::PolymorphicFamily;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn attachment_json(attachment_type: &str) -> serde_json::Value {
        json!({
            "attachmentType": attachment_type,
            "id": "ocid1.volumeattachment.oc1..aaaa",
            "availabilityDomain": "Uocm:PHX-AD-1",
            "compartmentId": "ocid1.compartment.oc1..bbbb",
            "instanceId": "ocid1.instance.oc1..cccc",
            "lifecycleState": "ATTACHED",
            "timeCreated": "2024-05-01T12:00:00Z",
            "volumeId": "ocid1.volume.oc1..dddd",
            "isReadOnly": false,
        })
    }

    #[test]
    fn test_volume_attachment_iscsi() {
        let mut value = attachment_json("iscsi");
        value["ipv4"] = json!("169.254.2.2");
        value["iqn"] = json!("iqn.2015-12.com.oracleiaas:abcd");
        value["port"] = json!(3260);
        let raw = serde_json::to_vec(&value).unwrap();

        let attachment = VolumeAttachment::decode(&raw).unwrap();
        let VolumeAttachment::IScsi(iscsi) = &attachment else {
            panic!("unexpected variant: {:?}", attachment);
        };
        assert_eq!(iscsi.port, 3260);
        assert_eq!(attachment.base().instance_id, "ocid1.instance.oc1..cccc");
        assert_eq!(
            attachment.base().lifecycle_state,
            VolumeAttachmentLifecycleState::Attached
        );
        assert_eq!(attachment.base().is_read_only, Some(false));
    }

    #[test]
    fn test_volume_attachment_iscsi_missing_target() {
        let raw = serde_json::to_vec(&attachment_json("iscsi")).unwrap();
        let error = VolumeAttachment::decode(&raw).unwrap_err();
        assert_matches!(
            error,
            DecodeError::MalformedVariant { discriminator: "iscsi", .. }
        );
    }

    #[test]
    fn test_volume_attachment_missing_base_field() {
        // Absent and null mandatory fields fail the same way, whether or not
        // the discriminator is recognized.
        for attachment_type in ["paravirtualized", "nvme"] {
            let mut value = attachment_json(attachment_type);
            value.as_object_mut().unwrap().remove("instanceId");
            let raw = serde_json::to_vec(&value).unwrap();
            assert_matches!(
                VolumeAttachment::decode(&raw),
                Err(DecodeError::MalformedEnvelope {
                    family: "VolumeAttachment",
                    ..
                })
            );

            value["instanceId"] = serde_json::Value::Null;
            let raw = serde_json::to_vec(&value).unwrap();
            assert_matches!(
                VolumeAttachment::decode(&raw),
                Err(DecodeError::MalformedEnvelope { .. })
            );
        }
    }

    #[test]
    fn test_volume_attachment_future_type() {
        let raw = serde_json::to_vec(&attachment_json("nvme")).unwrap();
        let attachment = VolumeAttachment::decode(&raw).unwrap();
        assert_matches!(&attachment, VolumeAttachment::Unknown(_));
        assert_eq!(attachment.base().volume_id, "ocid1.volume.oc1..dddd");
        assert_eq!(
            serde_json::to_value(&attachment).unwrap(),
            attachment_json("nvme")
        );
    }

    #[test]
    fn test_attach_details_encode() {
        let details =
            AttachVolumeDetails::from(AttachParavirtualizedVolumeDetails {
                base: AttachVolumeBase {
                    instance_id: String::from("ocid1.instance.oc1..cccc"),
                    volume_id: String::from("ocid1.volume.oc1..dddd"),
                    device: None,
                    display_name: None,
                    is_read_only: Some(true),
                    is_shareable: None,
                },
                is_pv_encryption_in_transit_enabled: Some(true),
            });
        assert_eq!(
            serde_json::to_value(&details).unwrap(),
            json!({
                "type": "paravirtualized",
                "instanceId": "ocid1.instance.oc1..cccc",
                "volumeId": "ocid1.volume.oc1..dddd",
                "isReadOnly": true,
                "isPvEncryptionInTransitEnabled": true,
            })
        );
    }

    #[test]
    fn test_boot_volume_source_is_mandatory() {
        let error = serde_json::from_value::<CreateBootVolumeDetails>(json!({
            "compartmentId": "ocid1.compartment.oc1..bbbb",
        }))
        .unwrap_err();
        assert!(error.to_string().contains("sourceDetails"), "{}", error);

        let details: CreateBootVolumeDetails = serde_json::from_str(
            r#"{
                "compartmentId": "ocid1.compartment.oc1..bbbb",
                "sourceDetails": {"type": "bootVolumeBackup", "id": "ocid1.bootvolumebackup.oc1..eeee"}
            }"#,
        )
        .unwrap();
        assert_matches!(
            details.source_details,
            BootVolumeSourceDetails::BootVolumeBackup(_)
        );
    }
}
