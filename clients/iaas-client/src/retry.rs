// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Describing when and how fast a failed request may be reissued
//!
//! This module only decides; running the retry loop belongs to whatever
//! transport sends the requests.

use crate::config::RetryConfig;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use http::StatusCode;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Statuses the service uses for throttling and transient failures
pub const DEFAULT_RETRYABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first.
    pub max_attempts: u32,
    pub backoff: ExponentialBackoff,
    pub retryable_statuses: Vec<StatusCode>,
}

impl RetryPolicy {
    pub fn default_policy() -> RetryPolicy {
        RetryPolicy::from_config(&RetryConfig::default())
    }

    /// A policy under which every request is attempted exactly once
    pub fn no_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 1,
            backoff: exponential_backoff(
                Duration::ZERO,
                Duration::ZERO,
            ),
            retryable_statuses: Vec::new(),
        }
    }

    pub fn from_config(config: &RetryConfig) -> RetryPolicy {
        RetryPolicy {
            max_attempts: config.max_attempts.max(1),
            backoff: exponential_backoff(
                Duration::from_millis(config.initial_interval_ms),
                Duration::from_millis(config.max_interval_ms),
            ),
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }

    /// Returns whether a request that just failed on its `attempt`-th try
    /// (counting from 1) should be sent again.
    ///
    /// `status` is `None` when no response arrived at all; such
    /// communication failures are retried as long as attempts remain.
    pub fn should_retry(
        &self,
        attempt: u32,
        status: Option<StatusCode>,
    ) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }
        match status {
            None => true,
            Some(status) => self.retryable_statuses.contains(&status),
        }
    }

    /// Returns a fresh backoff schedule for one logical request.
    pub fn new_backoff(&self) -> ExponentialBackoff {
        let mut backoff = self.backoff.clone();
        backoff.reset();
        backoff
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::default_policy()
    }
}

fn exponential_backoff(
    initial_interval: Duration,
    max_interval: Duration,
) -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: initial_interval,
        initial_interval,
        multiplier: 2.0,
        max_interval: max_interval.max(initial_interval),
        // Bounded by `max_attempts` instead.
        max_elapsed_time: None,
        ..ExponentialBackoff::default()
    }
}
