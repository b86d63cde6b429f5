// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client-side plumbing for the infrastructure API
//!
//! Turns typed requests into [`http::Request`]s and [`http::Response`]s back
//! into typed responses, with no opinion on how the bytes travel.

mod client;
pub mod config;
pub mod request;
pub mod response;
pub mod retry;

pub use client::Client;
pub use config::ClientConfig;
pub use request::ApiRequest;
pub use request::RequestError;
pub use response::ApiResponse;
pub use response::ResponseError;
pub use retry::RetryPolicy;

pub use iaas_types as types;
