//! RBLN device catalog
//!
//! Maps raw PCI device ids to product codes and product codes to
//! families. Pure lookups, no I/O.

use crate::error::{FeatureDiscoveryError, Result};
use std::fmt;

/// Known raw device ids and the product code each one reports as.
///
/// SR-IOV virtual functions carry their own ids and map to the product
/// of their physical function.
const DEVICE_PRODUCTS: &[(&str, &str)] = &[
    ("1020", "CA02"),
    ("1021", "CA02"), // CA02 VF
    ("1120", "CA12"),
    ("1121", "CA02"), // CA12 VF
    ("1150", "CA15"),
    ("1220", "CA22"),
    ("1221", "CA22"), // CA22 VF
    ("1250", "CA25"),
];

/// A discovered accelerator, as reported by rbln-daemon or sysfs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Hex device id without the `0x` prefix (e.g. `1020`)
    pub id: String,
}

impl Device {
    /// Create a device record from its raw id
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Coarse hardware generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFamily {
    /// `CA*` products
    Atom,
    /// `CR*` products
    Rebel,
}

impl DeviceFamily {
    /// Label value for this family
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Atom => "ATOM",
            Self::Rebel => "REBEL",
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product code such as `CA02`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProduct {
    code: String,
}

impl DeviceProduct {
    /// Wrap a product code without consulting the device table
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    /// Resolve a raw device id through the product table
    pub fn from_device_id(id: &str) -> Result<Self> {
        DEVICE_PRODUCTS
            .iter()
            .find(|(known, _)| *known == id)
            .map(|(_, code)| Self::new(*code))
            .ok_or_else(|| FeatureDiscoveryError::UnknownDevice(id.to_string()))
    }

    /// The bare product code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Label value, e.g. `RBLN-CA02`
    pub fn feature_label(&self) -> String {
        format!("RBLN-{}", self.code)
    }

    /// Classify the product by its two-letter prefix
    pub fn family(&self) -> Result<DeviceFamily> {
        if self.code.starts_with("CA") {
            Ok(DeviceFamily::Atom)
        } else if self.code.starts_with("CR") {
            Ok(DeviceFamily::Rebel)
        } else {
            Err(FeatureDiscoveryError::UnknownFamily(self.code.clone()))
        }
    }
}

impl fmt::Display for DeviceProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}
