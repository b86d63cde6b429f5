// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding the service's responses

use crate::request::OPC_REQUEST_ID;
use http::header::HeaderName;
use http::header::ETAG;
use http::StatusCode;
use iaas_types::block_storage::Volume;
use iaas_types::block_storage::VolumeAttachment;
use iaas_types::compute::Image;
use iaas_types::compute::Instance;
use iaas_types::networking::DrgAttachment;
use iaas_types::DecodeError;
use iaas_types::PolymorphicFamily;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use slog::debug;
use slog::Logger;
use thiserror::Error;

/// The decoded form of one operation's HTTP response
pub trait ApiResponse: Sized {
    fn from_http_response(
        log: &Logger,
        response: http::Response<Vec<u8>>,
    ) -> Result<Self, ResponseError>;
}

/// Headers common to all responses
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResponseMetadata {
    pub status: StatusCode,
    /// Quote this when asking the service operator about a request.
    pub opc_request_id: Option<String>,
    pub etag: Option<String>,
}

impl ResponseMetadata {
    fn from_response(response: &http::Response<Vec<u8>>) -> Self {
        let header = |name: &HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        };
        ResponseMetadata {
            status: response.status(),
            opc_request_id: header(&OPC_REQUEST_ID),
            etag: header(&ETAG),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error(
        "service returned {status} ({code}): {message} \
         (opc-request-id: {})",
        .opc_request_id.as_deref().unwrap_or("none")
    )]
    Service {
        status: StatusCode,
        code: String,
        message: String,
        opc_request_id: Option<String>,
    },
    /// The body is itself a polymorphic object and failed to decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The body failed to decode as JSON of the expected shape.
    ///
    /// A polymorphic object nested inside the body reports its failure here
    /// too, as the [`DecodeError`] message: serde carries only the text of a
    /// nested error, so the envelope/variant distinction survives in the
    /// message alone.
    #[error("malformed response body: {0}")]
    Body(#[from] serde_json::Error),
}

impl ResponseError {
    /// The HTTP status, when the service answered with an error
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ResponseError::Service { status, .. } => Some(*status),
            ResponseError::Decode(_) | ResponseError::Body(_) => None,
        }
    }
}

/// Body of a non-2xx response
#[derive(Deserialize)]
struct ServiceErrorBody {
    code: String,
    message: String,
}

/// Splits off the metadata, turning error statuses into
/// [`ResponseError::Service`].
fn check_status(
    response: &http::Response<Vec<u8>>,
) -> Result<ResponseMetadata, ResponseError> {
    let metadata = ResponseMetadata::from_response(response);
    if metadata.status.is_success() {
        return Ok(metadata);
    }
    let (code, message) =
        match serde_json::from_slice::<ServiceErrorBody>(response.body()) {
            Ok(body) => (body.code, body.message),
            Err(_) => (
                metadata
                    .status
                    .canonical_reason()
                    .unwrap_or("Unknown")
                    .to_owned(),
                String::from_utf8_lossy(response.body()).into_owned(),
            ),
        };
    Err(ResponseError::Service {
        status: metadata.status,
        code,
        message,
        opc_request_id: metadata.opc_request_id,
    })
}

fn decode_body<T: DeserializeOwned>(
    response: &http::Response<Vec<u8>>,
) -> Result<(ResponseMetadata, T), ResponseError> {
    let metadata = check_status(response)?;
    let body = serde_json::from_slice(response.body())?;
    Ok((metadata, body))
}

fn decode_family<F: PolymorphicFamily>(
    log: &Logger,
    response: &http::Response<Vec<u8>>,
) -> Result<(ResponseMetadata, F), ResponseError> {
    let metadata = check_status(response)?;
    let value = F::decode(response.body())?;
    note_fallback(log, &metadata, Some(&value));
    Ok((metadata, value))
}

/// Records, at debug level, that a polymorphic value was decoded without
/// its concrete shape.  This is expected whenever the service is newer than
/// the client.
fn note_fallback<F: PolymorphicFamily>(
    log: &Logger,
    metadata: &ResponseMetadata,
    value: Option<&F>,
) {
    if let Some(value) = value.filter(|value| !value.is_known()) {
        debug!(log, "unrecognized discriminator";
            "family" => F::NAME,
            "discriminator" => ?value.discriminator(),
            "opc_request_id" => ?metadata.opc_request_id,
        );
    }
}

/*
 * COMPUTE
 */

#[derive(Clone, Debug, PartialEq)]
pub struct CreateImageResponse {
    pub metadata: ResponseMetadata,
    pub image: Image,
}

impl ApiResponse for CreateImageResponse {
    fn from_http_response(
        _log: &Logger,
        response: http::Response<Vec<u8>>,
    ) -> Result<Self, ResponseError> {
        let (metadata, image) = decode_body(&response)?;
        Ok(CreateImageResponse { metadata, image })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LaunchInstanceResponse {
    pub metadata: ResponseMetadata,
    pub instance: Instance,
}

impl ApiResponse for LaunchInstanceResponse {
    fn from_http_response(
        log: &Logger,
        response: http::Response<Vec<u8>>,
    ) -> Result<Self, ResponseError> {
        let (metadata, instance) = decode_body::<Instance>(&response)?;
        note_fallback(log, &metadata, instance.source_details.as_ref());
        Ok(LaunchInstanceResponse { metadata, instance })
    }
}

/*
 * BLOCK STORAGE
 */

#[derive(Clone, Debug, PartialEq)]
pub struct CreateVolumeResponse {
    pub metadata: ResponseMetadata,
    pub volume: Volume,
}

impl ApiResponse for CreateVolumeResponse {
    fn from_http_response(
        log: &Logger,
        response: http::Response<Vec<u8>>,
    ) -> Result<Self, ResponseError> {
        let (metadata, volume) = decode_body::<Volume>(&response)?;
        note_fallback(log, &metadata, volume.source_details.as_ref());
        Ok(CreateVolumeResponse { metadata, volume })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttachVolumeResponse {
    pub metadata: ResponseMetadata,
    pub volume_attachment: VolumeAttachment,
}

impl ApiResponse for AttachVolumeResponse {
    fn from_http_response(
        log: &Logger,
        response: http::Response<Vec<u8>>,
    ) -> Result<Self, ResponseError> {
        let (metadata, volume_attachment) = decode_family(log, &response)?;
        Ok(AttachVolumeResponse { metadata, volume_attachment })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GetVolumeAttachmentResponse {
    pub metadata: ResponseMetadata,
    pub volume_attachment: VolumeAttachment,
}

impl ApiResponse for GetVolumeAttachmentResponse {
    fn from_http_response(
        log: &Logger,
        response: http::Response<Vec<u8>>,
    ) -> Result<Self, ResponseError> {
        let (metadata, volume_attachment) = decode_family(log, &response)?;
        Ok(GetVolumeAttachmentResponse { metadata, volume_attachment })
    }
}

/*
 * NETWORKING
 */

#[derive(Clone, Debug, PartialEq)]
pub struct CreateDrgAttachmentResponse {
    pub metadata: ResponseMetadata,
    pub drg_attachment: DrgAttachment,
}

impl ApiResponse for CreateDrgAttachmentResponse {
    fn from_http_response(
        log: &Logger,
        response: http::Response<Vec<u8>>,
    ) -> Result<Self, ResponseError> {
        let (metadata, drg_attachment) =
            decode_body::<DrgAttachment>(&response)?;
        note_fallback(log, &metadata, drg_attachment.network_details.as_ref());
        Ok(CreateDrgAttachmentResponse { metadata, drg_attachment })
    }
}
