// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::ClientConfig;
use crate::request::ApiRequest;
use crate::request::RequestError;
use crate::request::OPC_REQUEST_ID;
use crate::response::ApiResponse;
use crate::response::ResponseError;
use crate::retry::RetryPolicy;
use slog::debug;
use slog::o;
use slog::Logger;
use url::Url;

/// Builds requests for one regional endpoint and decodes its responses
///
/// There's no transport here: callers send the [`http::Request`]s however
/// they like and hand back the [`http::Response`]s.
#[derive(Clone, Debug)]
pub struct Client {
    endpoint: Url,
    log: Logger,
    retry_policy: RetryPolicy,
}

impl Client {
    pub fn new(endpoint: Url, log: &Logger) -> Client {
        Client::new_with_policy(endpoint, log, RetryPolicy::default_policy())
    }

    pub fn new_with_policy(
        endpoint: Url,
        log: &Logger,
        retry_policy: RetryPolicy,
    ) -> Client {
        let log = log.new(o!("endpoint" => endpoint.to_string()));
        Client { endpoint, log, retry_policy }
    }

    pub fn from_config(config: &ClientConfig, log: &Logger) -> Client {
        Client::new_with_policy(
            config.endpoint.clone(),
            &log.new(o!("region" => config.region.clone())),
            RetryPolicy::from_config(&config.retry),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the policy governing `request`: its own if it has one,
    /// otherwise the client's.
    pub fn retry_policy<'a, R: ApiRequest>(
        &'a self,
        request: &'a R,
    ) -> &'a RetryPolicy {
        request.retry_policy().unwrap_or(&self.retry_policy)
    }

    pub fn build_request<R: ApiRequest>(
        &self,
        request: &R,
    ) -> Result<http::Request<Vec<u8>>, RequestError> {
        let http_request = request.http_request(&self.endpoint)?;
        debug!(self.log, "client request";
            "method" => %http_request.method(),
            "uri" => %http_request.uri(),
            "opc_request_id" => ?http_request.headers().get(&OPC_REQUEST_ID),
        );
        Ok(http_request)
    }

    pub fn parse_response<R: ApiRequest>(
        &self,
        response: http::Response<Vec<u8>>,
    ) -> Result<R::Response, ResponseError> {
        let status = response.status();
        let result = R::Response::from_http_response(&self.log, response);
        match &result {
            Ok(_) => debug!(self.log, "client response"; "status" => %status),
            Err(error) => debug!(self.log, "client response";
                "status" => %status,
                "error" => %error,
            ),
        }
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::RetryConfig;
    use crate::request::GetVolumeAttachmentRequest;
    use http::StatusCode;

    fn test_log() -> Logger {
        Logger::root(slog::Discard, o!())
    }

    #[test]
    fn test_retry_policy_override() {
        let config: ClientConfig = toml::from_str(
            r#"
            endpoint = "https://iaas.us-ashburn-1.example.com"
            region = "us-ashburn-1"
            [retry]
            max_attempts = 2
            "#,
        )
        .unwrap();
        let client = Client::from_config(&config, &test_log());
        assert_eq!(
            client.endpoint().as_str(),
            "https://iaas.us-ashburn-1.example.com/"
        );

        let mut request = GetVolumeAttachmentRequest::new("ocid1.va");
        assert_eq!(client.retry_policy(&request).max_attempts, 2);
        request.retry_policy = Some(RetryPolicy::from_config(&RetryConfig {
            max_attempts: 5,
            ..RetryConfig::default()
        }));
        assert_eq!(client.retry_policy(&request).max_attempts, 5);
    }

    #[test]
    fn test_parse_response_error() {
        let client = Client::new(
            "https://iaas.us-ashburn-1.example.com".parse().unwrap(),
            &test_log(),
        );
        let response = http::Response::builder()
            .status(StatusCode::TOO_MANY_REQUESTS)
            .body(
                br#"{"code":"TooManyRequests","message":"slow down"}"#
                    .to_vec(),
            )
            .unwrap();
        let error = client
            .parse_response::<GetVolumeAttachmentRequest>(response)
            .unwrap_err();
        let request = GetVolumeAttachmentRequest::new("x");
        assert!(client.retry_policy(&request).should_retry(1, error.status()));
    }
}
