// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compute: instances and the images they boot from

use crate::enums::ImageLifecycleState;
use crate::enums::InstanceLifecycleState;
use crate::enums::LaunchMode;
use crate::enums::SourceImageType;
use crate::envelope::NoCommonFields;
use crate::polymorphic_family;
use chrono::DateTime;
use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/*
 * IMAGES
 */

/// Fields shared by every kind of [`ImageSourceDetails`]
#[derive(
    Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub struct ImageSourceBase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_system_version: Option<String>,
    /// Format of the source object.  Defaults to QCOW2 on the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image_type: Option<SourceImageType>,
}

/// An image in object storage, named by namespace, bucket and object
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSourceViaObjectStorageTupleDetails {
    #[serde(flatten)]
    pub base: ImageSourceBase,
    pub namespace_name: String,
    pub bucket_name: String,
    pub object_name: String,
}

/// An image in object storage, named by URL
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSourceViaObjectStorageUriDetails {
    #[serde(flatten)]
    pub base: ImageSourceBase,
    pub source_uri: String,
}

polymorphic_family! {
    /// Where the contents of an imported image come from
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum ImageSourceDetails {
        discriminator = "sourceType",
        base = ImageSourceBase,
        variants = {
            "objectStorageTuple" =>
                ObjectStorageTuple(ImageSourceViaObjectStorageTupleDetails),
            "objectStorageUri" =>
                ObjectStorageUri(ImageSourceViaObjectStorageUriDetails),
        }
    }
}

/// Create-time parameters for an [`Image`]
///
/// Exactly one of `image_source_details` (import) or `instance_id` (capture
/// a running instance) is expected.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImageDetails {
    pub compartment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freeform_tags: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_source_details: Option<ImageSourceDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_mode: Option<LaunchMode>,
}

/// Client view of an image
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    pub compartment_id: String,
    pub create_image_allowed: bool,
    pub lifecycle_state: ImageLifecycleState,
    pub operating_system: String,
    pub operating_system_version: String,
    pub time_created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_mode: Option<LaunchMode>,
    #[serde(
        rename = "sizeInMBs",
        skip_serializing_if = "Option::is_none"
    )]
    pub size_in_mbs: Option<i64>,
}

/*
 * INSTANCES
 */

/// Boot from a fresh boot volume created from an image
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSourceViaImageDetails {
    #[serde(flatten)]
    pub base: NoCommonFields,
    pub image_id: String,
    #[serde(
        rename = "bootVolumeSizeInGBs",
        skip_serializing_if = "Option::is_none"
    )]
    pub boot_volume_size_in_gbs: Option<i64>,
    #[serde(
        rename = "bootVolumeVpusPerGB",
        skip_serializing_if = "Option::is_none"
    )]
    pub boot_volume_vpus_per_gb: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
}

/// Boot from an existing boot volume
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSourceViaBootVolumeDetails {
    #[serde(flatten)]
    pub base: NoCommonFields,
    pub boot_volume_id: String,
}

polymorphic_family! {
    /// What an instance boots from
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum InstanceSourceDetails {
        discriminator = "sourceType",
        base = NoCommonFields,
        variants = {
            "image" => Image(InstanceSourceViaImageDetails),
            "bootVolume" => BootVolume(InstanceSourceViaBootVolumeDetails),
        }
    }
}

/// Create-time parameters for an [`Instance`]
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchInstanceDetails {
    pub availability_domain: String,
    pub compartment_id: String,
    pub shape: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freeform_tags: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_mode: Option<LaunchMode>,
    /// Custom metadata passed to the instance (e.g. `ssh_authorized_keys`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_details: Option<InstanceSourceDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
}

/// Client view of an instance
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub availability_domain: String,
    pub compartment_id: String,
    pub lifecycle_state: InstanceLifecycleState,
    pub region: String,
    pub shape: String,
    pub time_created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_mode: Option<LaunchMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_details: Option<InstanceSourceDetails>,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::envelope::DecodeError;
    use crate::envelope::PolymorphicFamily;
    use assert_matches::assert_matches;

    #[test]
    fn test_image_source_base_fields() {
        let raw = br#"{
            "sourceType": "objectStorageTuple",
            "namespaceName": "ns",
            "bucketName": "images",
            "objectName": "ol9.qcow2",
            "operatingSystem": "Oracle Linux",
            "operatingSystemVersion": "9",
            "sourceImageType": "QCOW2"
        }"#;
        let source = ImageSourceDetails::decode(raw).unwrap();
        let ImageSourceDetails::ObjectStorageTuple(tuple) = &source else {
            panic!("unexpected variant: {:?}", source);
        };
        assert_eq!(tuple.object_name, "ol9.qcow2");
        assert_eq!(
            source.base(),
            &ImageSourceBase {
                operating_system: Some(String::from("Oracle Linux")),
                operating_system_version: Some(String::from("9")),
                source_image_type: Some(SourceImageType::Qcow2),
            }
        );
    }

    #[test]
    fn test_image_source_future_type() {
        let raw = br#"{"sourceType":"objectStorageNamedRef","operatingSystem":"Linux","sourceImageType":"RAW"}"#;
        let source = ImageSourceDetails::decode(raw).unwrap();
        assert!(!source.is_known());
        assert_eq!(source.discriminator(), Some("objectStorageNamedRef"));
        assert_eq!(source.base().operating_system.as_deref(), Some("Linux"));
        assert_eq!(
            source.base().source_image_type,
            Some(SourceImageType::Unknown(String::from("RAW")))
        );
    }

    #[test]
    fn test_instance_source_via_image() {
        let raw = br#"{"sourceType":"image","imageId":"ocid1.image.A","bootVolumeSizeInGBs":50}"#;
        let source = InstanceSourceDetails::decode(raw).unwrap();
        assert_eq!(
            source,
            InstanceSourceDetails::Image(InstanceSourceViaImageDetails {
                base: NoCommonFields {},
                image_id: String::from("ocid1.image.A"),
                boot_volume_size_in_gbs: Some(50),
                boot_volume_vpus_per_gb: None,
                kms_key_id: None,
            })
        );

        let error =
            InstanceSourceDetails::decode(br#"{"sourceType":"image"}"#)
                .unwrap_err();
        assert_matches!(
            error,
            DecodeError::MalformedVariant {
                family: "InstanceSourceDetails",
                discriminator: "image",
                ..
            }
        );
    }

    #[test]
    fn test_launch_details_nested_source() {
        let details: LaunchInstanceDetails = serde_json::from_str(
            r#"{
                "availabilityDomain": "Uocm:PHX-AD-1",
                "compartmentId": "ocid1.compartment.oc1..aaaa",
                "shape": "VM.Standard.E4.Flex",
                "sourceDetails": {
                    "sourceType": "bootVolume",
                    "bootVolumeId": "ocid1.bootvolume.oc1..bbbb"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            details.source_details,
            Some(InstanceSourceDetails::BootVolume(
                InstanceSourceViaBootVolumeDetails {
                    base: NoCommonFields {},
                    boot_volume_id: String::from("ocid1.bootvolume.oc1..bbbb"),
                }
            ))
        );

        let encoded = serde_json::to_value(&details).unwrap();
        assert_eq!(
            encoded["sourceDetails"],
            serde_json::json!({
                "sourceType": "bootVolume",
                "bootVolumeId": "ocid1.bootvolume.oc1..bbbb",
            })
        );
        assert!(encoded.get("displayName").is_none());
    }

    #[test]
    fn test_instance_with_unrecognized_source() {
        let instance: Instance = serde_json::from_str(
            r#"{
                "id": "ocid1.instance.oc1..cccc",
                "availabilityDomain": "Uocm:PHX-AD-1",
                "compartmentId": "ocid1.compartment.oc1..aaaa",
                "lifecycleState": "RUNNING",
                "region": "phx",
                "shape": "VM.Standard.E4.Flex",
                "timeCreated": "2024-05-01T12:00:00Z",
                "sourceDetails": {
                    "sourceType": "snapshotClone",
                    "snapshotId": "ocid1.snapshot.oc1..dddd"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(instance.lifecycle_state, InstanceLifecycleState::Running);
        let source = instance.source_details.expect("source details");
        assert_eq!(source.discriminator(), Some("snapshotClone"));
        assert!(!source.is_known());
    }
}
