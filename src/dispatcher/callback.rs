// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Callback delivery: fire-and-retry POST to `callbackUrl` with exponential
//! backoff, up to `N` attempts (spec §4.3 Correlation & completion, §5
//! Cancellation and timeouts).

use std::time::Duration;

use serde::Serialize;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

use crate::observability::messages::{dispatcher::CallbackDeliveryFailed, StructuredLog};

pub struct CallbackClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    attempts: u32,
}

impl CallbackClient {
    pub fn new(url: impl Into<String>, timeout: Duration, attempts: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
            attempts,
        }
    }

    /// Deliver `body` to the callback URL, retrying with exponential
    /// backoff. On permanent failure, the Solution is retained by the
    /// caller's error log rather than blocking further dispatch — this
    /// function simply reports success/failure.
    pub async fn deliver<T: Serialize + Sync>(&self, body: &T) -> Result<(), String> {
        let backoff = ExponentialBackoff::from_millis(200).map(jitter).take(self.attempts as usize);
        let mut attempt = 0u32;

        let result = Retry::spawn(backoff, || {
            attempt += 1;
            let url = self.url.clone();
            let client = self.client.clone();
            let timeout = self.timeout;
            async move {
                client
                    .post(&url)
                    .timeout(timeout)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| e.to_string())?
                    .error_for_status()
                    .map_err(|e| e.to_string())
            }
        })
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(reason) => {
                CallbackDeliveryFailed { url: &self.url, attempt: self.attempts, reason: &reason }.log();
                Err(reason)
            }
        }
    }
}
