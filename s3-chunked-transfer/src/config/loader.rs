/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_types::region::Region;

use crate::config::Builder;
use crate::error::Error;
use crate::types::FailedMultipartUploadPolicy;
use crate::Config;

/// Region used when neither the loader nor the environment provides one.
///
/// S3-compatible servers such as MinIO accept any region but the SDK requires one to be set.
const FALLBACK_REGION: &str = "us-east-1";

/// Load a [`Config`] for an S3-compatible endpoint.
///
/// Anything not set explicitly is resolved from the environment the same way the AWS SDK does it
/// (environment variables, shared config files, etc).
#[derive(Default, Debug)]
pub struct ConfigLoader {
    builder: Builder,
    endpoint: Option<String>,
    credentials: Option<(String, String)>,
    region: Option<String>,
    disable_tls: bool,
}

impl ConfigLoader {
    /// Address of the object store, e.g. `localhost:9000`.
    ///
    /// When set, requests use path style addressing (`endpoint/bucket/key`). An address without a
    /// scheme is prefixed with `https://` or `http://` depending on [`use_tls`](Self::use_tls).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Static access key / secret key pair
    pub fn credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.credentials = Some((access_key.into(), secret_key.into()));
        self
    }

    /// Whether to connect to the endpoint over TLS. Default is `true`.
    pub fn use_tls(mut self, use_tls: bool) -> Self {
        self.disable_tls = !use_tls;
        self
    }

    /// Region to sign requests for
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Number of bytes read from a source at a time.
    ///
    /// Default is 32 KiB.
    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.builder = self.builder.chunk_size(chunk_size);
        self
    }

    /// Part size and multipart threshold in bytes.
    ///
    /// Default is 5 MiB.
    pub fn part_size(mut self, part_size: u64) -> Self {
        self.builder = self.builder.part_size(part_size);
        self
    }

    /// Policy applied when a multipart upload fails after it was created.
    pub fn failed_multipart_upload_policy(mut self, policy: FailedMultipartUploadPolicy) -> Self {
        self.builder = self.builder.failed_multipart_upload_policy(policy);
        self
    }

    fn endpoint_url(&self) -> Option<String> {
        let endpoint = self.endpoint.as_deref()?;
        if endpoint.contains("://") {
            return Some(endpoint.to_owned());
        }
        let scheme = if self.disable_tls { "http" } else { "https" };
        Some(format!("{scheme}://{endpoint}"))
    }

    /// Load the configuration
    ///
    /// If fields have been overridden during builder construction, the override values will be
    /// used. Otherwise, the default values for each field will be provided.
    pub async fn load(self) -> Result<Config, Error> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some((access_key, secret_key)) = &self.credentials {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "s3-chunked-transfer",
            ));
        }
        let shared_config = loader.load().await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&shared_config);
        if shared_config.region().is_none() {
            s3_config = s3_config.region(Region::from_static(FALLBACK_REGION));
        }
        if let Some(endpoint_url) = self.endpoint_url() {
            tracing::debug!("using endpoint {endpoint_url}");
            s3_config = s3_config.endpoint_url(endpoint_url).force_path_style(true);
        }

        let s3_client = aws_sdk_s3::Client::from_conf(s3_config.build());
        self.builder.client(s3_client).build()
    }
}
