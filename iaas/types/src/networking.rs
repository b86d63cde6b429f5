// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Virtual networking: dynamic routing gateway (DRG) attachments

use crate::enums::DrgAttachmentLifecycleState;
use crate::enums::VcnRouteType;
use crate::polymorphic_family;
use chrono::DateTime;
use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

/// Fields shared by every kind of [`DrgAttachmentNetworkDetails`]
#[derive(
    Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize,
)]
pub struct DrgAttachmentNetworkBase {
    /// id of the attached network resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VcnDrgAttachmentNetworkDetails {
    #[serde(flatten)]
    pub base: DrgAttachmentNetworkBase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_table_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcn_route_type: Option<VcnRouteType>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpsecTunnelDrgAttachmentNetworkDetails {
    #[serde(flatten)]
    pub base: DrgAttachmentNetworkBase,
    pub ipsec_connection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_attachment_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualCircuitDrgAttachmentNetworkDetails {
    #[serde(flatten)]
    pub base: DrgAttachmentNetworkBase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_only_mode: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct RemotePeeringConnectionDrgAttachmentNetworkDetails {
    #[serde(flatten)]
    pub base: DrgAttachmentNetworkBase,
}

polymorphic_family! {
    /// The network resource on the far side of a DRG attachment
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum DrgAttachmentNetworkDetails {
        discriminator = "type",
        base = DrgAttachmentNetworkBase,
        variants = {
            "VCN" => Vcn(VcnDrgAttachmentNetworkDetails),
            "IPSEC_TUNNEL" =>
                IpsecTunnel(IpsecTunnelDrgAttachmentNetworkDetails),
            "VIRTUAL_CIRCUIT" =>
                VirtualCircuit(VirtualCircuitDrgAttachmentNetworkDetails),
            "REMOTE_PEERING_CONNECTION" =>
                RemotePeeringConnection(
                    RemotePeeringConnectionDrgAttachmentNetworkDetails
                ),
        }
    }
}

/// Create-time parameters for a [`DrgAttachment`]
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDrgAttachmentDetails {
    pub drg_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drg_route_table_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_details: Option<DrgAttachmentNetworkDetails>,
    /// Deprecated in favor of `network_details`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcn_id: Option<String>,
}

/// Client view of a DRG attachment
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrgAttachment {
    pub id: String,
    pub compartment_id: String,
    pub drg_id: String,
    pub lifecycle_state: DrgAttachmentLifecycleState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drg_route_table_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_cross_tenancy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_details: Option<DrgAttachmentNetworkDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,
}
