//! Location summary from configured coordinates.
//!
//! Reverse geocoding is not performed here: the place name comes from the
//! `label` the user configured.

use async_trait::async_trait;
use greenbible_config::LocationConfig;
use greenbible_core::location::{LocationProvider, LocationSummary};

/// A location provider backed by static configuration.
#[derive(Debug, Clone)]
pub struct ConfiguredLocation {
    enabled: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
    label: Option<String>,
}

impl ConfiguredLocation {
    pub fn new(config: &LocationConfig) -> Self {
        Self {
            enabled: config.enabled,
            latitude: config.latitude,
            longitude: config.longitude,
            label: config.label.clone(),
        }
    }

    /// Render the summary without awaiting.
    pub fn describe(&self) -> LocationSummary {
        if !self.enabled {
            return LocationSummary::denied();
        }

        let label = self
            .label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());

        match (self.latitude, self.longitude, label) {
            (Some(lat), Some(lon), Some(label)) => {
                LocationSummary::known(format!("{label} ({lat:.4}, {lon:.4})"))
            }
            (Some(lat), Some(lon), None) => {
                LocationSummary::known(format!("Lat {lat:.4}, Lon {lon:.4}"))
            }
            (_, _, Some(label)) => LocationSummary::known(label),
            _ => LocationSummary::unknown(),
        }
    }
}

#[async_trait]
impl LocationProvider for ConfiguredLocation {
    async fn summary(&self) -> LocationSummary {
        self.describe()
    }
}
