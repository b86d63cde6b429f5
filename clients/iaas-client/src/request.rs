// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Requests the client knows how to build

use crate::response::ApiResponse;
use crate::response::AttachVolumeResponse;
use crate::response::CreateDrgAttachmentResponse;
use crate::response::CreateImageResponse;
use crate::response::CreateVolumeResponse;
use crate::response::GetVolumeAttachmentResponse;
use crate::response::LaunchInstanceResponse;
use crate::retry::RetryPolicy;
use http::header::HeaderName;
use http::header::ACCEPT;
use http::header::CONTENT_TYPE;
use http::header::IF_MATCH;
use http::Method;
use iaas_types::block_storage::AttachVolumeDetails;
use iaas_types::block_storage::CreateVolumeDetails;
use iaas_types::block_storage::VolumeSourceDetails;
use iaas_types::compute::CreateImageDetails;
use iaas_types::compute::ImageSourceDetails;
use iaas_types::compute::LaunchInstanceDetails;
use iaas_types::networking::CreateDrgAttachmentDetails;
use iaas_types::networking::DrgAttachmentNetworkDetails;
use iaas_types::PolymorphicFamily;
use iaas_types::StringEnum;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Leading path segment of every operation
pub const API_VERSION: &str = "20160918";

/// Identifies a request in the service's logs; echoed back in the response.
pub const OPC_REQUEST_ID: HeaderName =
    HeaderName::from_static("opc-request-id");

/// Makes a create operation idempotent across retries.
pub const OPC_RETRY_TOKEN: HeaderName =
    HeaderName::from_static("opc-retry-token");

const APPLICATION_JSON: &str = "application/json";

/// Optional headers any request may carry
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestHeaders {
    /// Generated when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opc_request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opc_retry_token: Option<String>,
    /// Only act if the resource's current etag matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_match: Option<String>,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("endpoint {endpoint} cannot carry a path")]
    Endpoint { endpoint: Url },
    #[error("failed to encode request body: {0}")]
    Body(#[source] serde_json::Error),
    #[error("failed to build request: {0}")]
    Http(#[from] http::Error),
    #[error(
        "unknown value {value:?} for {field} (supported values: {supported})"
    )]
    UnknownEnumValue { field: &'static str, value: String, supported: String },
    #[error(
        "{field} is an unrecognized {family} (discriminator {discriminator:?}) \
         and cannot be sent"
    )]
    UnknownVariant {
        field: &'static str,
        family: &'static str,
        discriminator: Option<String>,
    },
}

/// A request for one API operation
///
/// Implementors describe the operation; [`ApiRequest::http_request`] turns
/// that description into an [`http::Request`].  Sending it is up to the
/// caller.
pub trait ApiRequest: Serialize {
    const METHOD: Method;

    type Body: Serialize;
    type Response: ApiResponse;

    /// Path below [`API_VERSION`], one element per segment.  Segments are
    /// percent-encoded when the URL is built.
    fn path_segments(&self) -> Vec<&str>;

    fn body(&self) -> Option<&Self::Body>;

    fn headers(&self) -> &RequestHeaders;

    /// A policy overriding the client's default for this request
    fn retry_policy(&self) -> Option<&RetryPolicy>;

    /// Rejects enumeration values and polymorphic variants this client does
    /// not recognize.  Those may be decoded from a response, but are never
    /// sent back.
    fn validate_enum_values(&self) -> Result<(), RequestError>;

    fn http_request(
        &self,
        endpoint: &Url,
    ) -> Result<http::Request<Vec<u8>>, RequestError> {
        self.validate_enum_values()?;

        let mut url = endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| RequestError::Endpoint {
                endpoint: endpoint.clone(),
            })?
            .pop_if_empty()
            .push(API_VERSION)
            .extend(self.path_segments());

        let headers = self.headers();
        let request_id = headers
            .opc_request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut builder = http::Request::builder()
            .method(Self::METHOD)
            .uri(url.as_str())
            .header(ACCEPT, APPLICATION_JSON)
            .header(OPC_REQUEST_ID, request_id);
        if let Some(token) = &headers.opc_retry_token {
            builder = builder.header(OPC_RETRY_TOKEN, token.as_str());
        }
        if let Some(etag) = &headers.if_match {
            builder = builder.header(IF_MATCH, etag.as_str());
        }

        let body = match self.body() {
            Some(body) => {
                builder = builder.header(CONTENT_TYPE, APPLICATION_JSON);
                serde_json::to_vec(body).map_err(RequestError::Body)?
            }
            None => Vec::new(),
        };
        Ok(builder.body(body)?)
    }
}

fn check_enum<E: StringEnum>(
    field: &'static str,
    value: Option<&E>,
) -> Result<(), RequestError> {
    match value {
        Some(value) if !value.is_known() => {
            Err(RequestError::UnknownEnumValue {
                field,
                value: value.to_string(),
                supported: E::supported_values(),
            })
        }
        _ => Ok(()),
    }
}

fn check_family<F: PolymorphicFamily>(
    field: &'static str,
    value: Option<&F>,
) -> Result<(), RequestError> {
    match value {
        Some(value) if !value.is_known() => Err(RequestError::UnknownVariant {
            field,
            family: F::NAME,
            discriminator: value.discriminator().map(str::to_owned),
        }),
        _ => Ok(()),
    }
}

/// Renders a request as JSON, for diagnostics
macro_rules! display_as_json {
    ($($request:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $request {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    let json = serde_json::to_string(self)
                        .map_err(|_| fmt::Error)?;
                    f.write_str(&json)
                }
            }
        )+
    };
}

display_as_json!(
    CreateImageRequest,
    LaunchInstanceRequest,
    CreateVolumeRequest,
    AttachVolumeRequest,
    GetVolumeAttachmentRequest,
    CreateDrgAttachmentRequest,
);

/*
 * COMPUTE
 */

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImageRequest {
    pub create_image_details: CreateImageDetails,
    #[serde(flatten)]
    pub headers: RequestHeaders,
    #[serde(skip)]
    pub retry_policy: Option<RetryPolicy>,
}

impl CreateImageRequest {
    pub fn new(create_image_details: CreateImageDetails) -> Self {
        CreateImageRequest {
            create_image_details,
            headers: RequestHeaders::default(),
            retry_policy: None,
        }
    }
}

impl ApiRequest for CreateImageRequest {
    const METHOD: Method = Method::POST;
    type Body = CreateImageDetails;
    type Response = CreateImageResponse;

    fn path_segments(&self) -> Vec<&str> {
        vec!["images"]
    }

    fn body(&self) -> Option<&CreateImageDetails> {
        Some(&self.create_image_details)
    }

    fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }

    fn validate_enum_values(&self) -> Result<(), RequestError> {
        let details = &self.create_image_details;
        check_enum("launchMode", details.launch_mode.as_ref())?;
        let source = details.image_source_details.as_ref();
        check_family::<ImageSourceDetails>("imageSourceDetails", source)?;
        check_enum(
            "imageSourceDetails.sourceImageType",
            source.and_then(|s| s.base().source_image_type.as_ref()),
        )
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchInstanceRequest {
    pub launch_instance_details: LaunchInstanceDetails,
    #[serde(flatten)]
    pub headers: RequestHeaders,
    #[serde(skip)]
    pub retry_policy: Option<RetryPolicy>,
}

impl LaunchInstanceRequest {
    pub fn new(launch_instance_details: LaunchInstanceDetails) -> Self {
        LaunchInstanceRequest {
            launch_instance_details,
            headers: RequestHeaders::default(),
            retry_policy: None,
        }
    }
}

impl ApiRequest for LaunchInstanceRequest {
    const METHOD: Method = Method::POST;
    type Body = LaunchInstanceDetails;
    type Response = LaunchInstanceResponse;

    fn path_segments(&self) -> Vec<&str> {
        vec!["instances"]
    }

    fn body(&self) -> Option<&LaunchInstanceDetails> {
        Some(&self.launch_instance_details)
    }

    fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }

    fn validate_enum_values(&self) -> Result<(), RequestError> {
        let details = &self.launch_instance_details;
        check_enum("launchMode", details.launch_mode.as_ref())?;
        check_family("sourceDetails", details.source_details.as_ref())
    }
}

/*
 * BLOCK STORAGE
 */

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVolumeRequest {
    pub create_volume_details: CreateVolumeDetails,
    #[serde(flatten)]
    pub headers: RequestHeaders,
    #[serde(skip)]
    pub retry_policy: Option<RetryPolicy>,
}

impl CreateVolumeRequest {
    pub fn new(create_volume_details: CreateVolumeDetails) -> Self {
        CreateVolumeRequest {
            create_volume_details,
            headers: RequestHeaders::default(),
            retry_policy: None,
        }
    }
}

impl ApiRequest for CreateVolumeRequest {
    const METHOD: Method = Method::POST;
    type Body = CreateVolumeDetails;
    type Response = CreateVolumeResponse;

    fn path_segments(&self) -> Vec<&str> {
        vec!["volumes"]
    }

    fn body(&self) -> Option<&CreateVolumeDetails> {
        Some(&self.create_volume_details)
    }

    fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }

    fn validate_enum_values(&self) -> Result<(), RequestError> {
        check_family::<VolumeSourceDetails>(
            "sourceDetails",
            self.create_volume_details.source_details.as_ref(),
        )
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachVolumeRequest {
    pub attach_volume_details: AttachVolumeDetails,
    #[serde(flatten)]
    pub headers: RequestHeaders,
    #[serde(skip)]
    pub retry_policy: Option<RetryPolicy>,
}

impl AttachVolumeRequest {
    pub fn new(attach_volume_details: AttachVolumeDetails) -> Self {
        AttachVolumeRequest {
            attach_volume_details,
            headers: RequestHeaders::default(),
            retry_policy: None,
        }
    }
}

impl ApiRequest for AttachVolumeRequest {
    const METHOD: Method = Method::POST;
    type Body = AttachVolumeDetails;
    type Response = AttachVolumeResponse;

    fn path_segments(&self) -> Vec<&str> {
        vec!["volumeAttachments"]
    }

    fn body(&self) -> Option<&AttachVolumeDetails> {
        Some(&self.attach_volume_details)
    }

    fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }

    fn validate_enum_values(&self) -> Result<(), RequestError> {
        let details = &self.attach_volume_details;
        check_family("attachVolumeDetails", Some(details))?;
        if let AttachVolumeDetails::IScsi(iscsi) = details {
            check_enum(
                "attachVolumeDetails.encryptionInTransitType",
                iscsi.encryption_in_transit_type.as_ref(),
            )?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVolumeAttachmentRequest {
    pub volume_attachment_id: String,
    #[serde(flatten)]
    pub headers: RequestHeaders,
    #[serde(skip)]
    pub retry_policy: Option<RetryPolicy>,
}

impl GetVolumeAttachmentRequest {
    pub fn new(volume_attachment_id: impl Into<String>) -> Self {
        GetVolumeAttachmentRequest {
            volume_attachment_id: volume_attachment_id.into(),
            headers: RequestHeaders::default(),
            retry_policy: None,
        }
    }
}

impl ApiRequest for GetVolumeAttachmentRequest {
    const METHOD: Method = Method::GET;
    type Body = ();
    type Response = GetVolumeAttachmentResponse;

    fn path_segments(&self) -> Vec<&str> {
        vec!["volumeAttachments", self.volume_attachment_id.as_str()]
    }

    fn body(&self) -> Option<&()> {
        None
    }

    fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }

    fn validate_enum_values(&self) -> Result<(), RequestError> {
        Ok(())
    }
}

/*
 * NETWORKING
 */

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDrgAttachmentRequest {
    pub create_drg_attachment_details: CreateDrgAttachmentDetails,
    #[serde(flatten)]
    pub headers: RequestHeaders,
    #[serde(skip)]
    pub retry_policy: Option<RetryPolicy>,
}

impl CreateDrgAttachmentRequest {
    pub fn new(
        create_drg_attachment_details: CreateDrgAttachmentDetails,
    ) -> Self {
        CreateDrgAttachmentRequest {
            create_drg_attachment_details,
            headers: RequestHeaders::default(),
            retry_policy: None,
        }
    }
}

impl ApiRequest for CreateDrgAttachmentRequest {
    const METHOD: Method = Method::POST;
    type Body = CreateDrgAttachmentDetails;
    type Response = CreateDrgAttachmentResponse;

    fn path_segments(&self) -> Vec<&str> {
        vec!["drgAttachments"]
    }

    fn body(&self) -> Option<&CreateDrgAttachmentDetails> {
        Some(&self.create_drg_attachment_details)
    }

    fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }

    fn validate_enum_values(&self) -> Result<(), RequestError> {
        let network =
            self.create_drg_attachment_details.network_details.as_ref();
        check_family::<DrgAttachmentNetworkDetails>("networkDetails", network)?;
        if let Some(DrgAttachmentNetworkDetails::Vcn(vcn)) = network {
            check_enum(
                "networkDetails.vcnRouteType",
                vcn.vcn_route_type.as_ref(),
            )?;
        }
        Ok(())
    }
}
