//! Collected feature record
//!
//! The facts one collection cycle produces, and their rendering as
//! node-feature-discovery labels.

use crate::device::{DeviceFamily, DeviceProduct, DriverVersion};
use crate::error::Result;
use std::fmt;

/// Namespace every label is published under
pub const LABEL_PREFIX: &str = "rebellions.ai";

/// Facts gathered in one collection cycle.
///
/// `npu_count`, `npu_family` and `npu_product` are only ever set together
/// through [`Features::record_devices`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Features {
    /// At least one RBLN device was found
    pub npu_present: bool,
    /// Number of serviceable devices
    pub npu_count: Option<usize>,
    /// Family of the first device
    pub npu_family: Option<DeviceFamily>,
    /// Product label of the first device, e.g. `RBLN-CA02`
    pub npu_product: Option<String>,
    /// Driver version, when one could be read
    pub driver_version: Option<DriverVersion>,
}

impl Features {
    /// Record device presence from the first device's product.
    ///
    /// Leaves the record untouched if the product has no known family.
    pub fn record_devices(&mut self, count: usize, first: &DeviceProduct) -> Result<()> {
        let family = first.family()?;

        self.npu_present = true;
        self.npu_count = Some(count);
        self.npu_family = Some(family);
        self.npu_product = Some(first.feature_label());
        Ok(())
    }

    /// Classify how complete this record is
    pub fn outcome(&self) -> Outcome {
        match (self.npu_present, self.driver_version.is_some()) {
            (true, true) => Outcome::Full,
            (false, false) => Outcome::Absent,
            _ => Outcome::Partial,
        }
    }

    /// Label keys and values in publish order
    pub fn labels(&self) -> Vec<(&'static str, String)> {
        let mut labels = vec![("npu.present", self.npu_present.to_string())];

        if let Some(count) = self.npu_count {
            labels.push(("npu.count", count.to_string()));
        }
        if let Some(family) = self.npu_family {
            labels.push(("npu.family", family.to_string()));
        }
        if let Some(product) = &self.npu_product {
            labels.push(("npu.product", product.clone()));
        }
        if let Some(version) = &self.driver_version {
            labels.push(("driver-version.full", version.full.clone()));
            labels.push(("driver-version.major", version.major.clone()));
            labels.push(("driver-version.minor", version.minor.clone()));
            labels.push(("driver-version.patch", version.patch.clone()));
            if let Some(revision) = &version.revision {
                labels.push(("driver-version.revision", revision.clone()));
            }
        }

        labels
    }

    /// Render as `key=value` lines under [`LABEL_PREFIX`]
    pub fn to_plain_text(&self) -> String {
        self.labels()
            .iter()
            .map(|(key, value)| format!("{}/{}={}\n", LABEL_PREFIX, key, value))
            .collect()
    }
}

/// How much a source was able to tell us
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Devices and driver version
    Full,
    /// Devices without version, or version without devices
    Partial,
    /// Source answered that there are no devices
    Absent,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Full => "full",
            Self::Partial => "partial",
            Self::Absent => "absent",
        })
    }
}
