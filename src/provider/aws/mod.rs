//! # AWS EC2 Zone Probe
//!
//! Queries availability zone state through EC2 `DescribeAvailabilityZones`.
//!
//! The region for each call is derived from the zone identifier. Credentials
//! come from the default AWS credential chain (environment, profile, IRSA,
//! instance metadata).

use crate::error::ProbeError;
use crate::provider::ZoneStateProbe;
use crate::zone::{ZoneId, ZoneState};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::Client as Ec2Client;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, info_span, Instrument};

/// EC2-backed zone state probe
///
/// Keeps one EC2 client per region. Zone states themselves are never cached.
pub struct Ec2ZoneProbe {
    sdk_config: SdkConfig,
    endpoint_url: Option<String>,
    clients: Mutex<HashMap<String, Ec2Client>>,
}

impl std::fmt::Debug for Ec2ZoneProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ec2ZoneProbe")
            .field("endpoint_url", &self.endpoint_url)
            .finish_non_exhaustive()
    }
}

impl Ec2ZoneProbe {
    /// Create a probe using the default credential chain
    ///
    /// `endpoint_url` overrides the EC2 endpoint, e.g. for a local mock.
    pub async fn new(endpoint_url: Option<String>) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        if let Some(url) = &endpoint_url {
            info!("Using EC2 endpoint override: {}", url);
        }
        Self::from_sdk_config(sdk_config, endpoint_url)
    }

    #[must_use]
    pub fn from_sdk_config(sdk_config: SdkConfig, endpoint_url: Option<String>) -> Self {
        Self {
            sdk_config,
            endpoint_url,
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn client_for_region(&self, region: &str) -> Ec2Client {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        clients
            .entry(region.to_string())
            .or_insert_with(|| {
                debug!("Creating EC2 client for region {}", region);
                let mut builder = aws_sdk_ec2::config::Builder::from(&self.sdk_config)
                    .region(aws_config::Region::new(region.to_string()));
                if let Some(url) = &self.endpoint_url {
                    builder = builder.endpoint_url(url);
                }
                Ec2Client::from_conf(builder.build())
            })
            .clone()
    }
}

#[async_trait]
impl ZoneStateProbe for Ec2ZoneProbe {
    async fn probe(&self, zone: &ZoneId) -> Result<ZoneState, ProbeError> {
        let region = zone.region().to_string();
        let span = info_span!("aws.ec2.describe_availability_zones", zone = %zone, region = %region);
        let client = self.client_for_region(&region);

        async move {
            info!(
                "Checking state for availability zone '{}' in region '{}'",
                zone, region
            );

            let output = client
                .describe_availability_zones()
                .zone_names(zone.as_str())
                .send()
                .await
                .map_err(|e| ProbeError::Query {
                    zone: zone.clone(),
                    region: region.clone(),
                    message: DisplayErrorContext(&e).to_string(),
                })?;

            let raw_state = output
                .availability_zones()
                .iter()
                .find(|az| az.zone_name() == Some(zone.as_str()))
                .and_then(|az| az.state())
                .map(|state| state.as_str().to_string())
                .ok_or_else(|| ProbeError::NotFound { zone: zone.clone() })?;

            let state = ZoneState::from_api(&raw_state);
            info!(
                "Availability zone '{}' is currently in state: {} ({})",
                zone, raw_state, state
            );
            Ok(state)
        }
        .instrument(span)
        .await
    }
}
