//! Sysfs device scanner
//!
//! Finds RBLN accelerators by walking the PCI device tree and reads the
//! loaded driver's version from the rebellions device class. Used when
//! rbln-daemon is not reachable.

use crate::device::Device;
use crate::error::{FeatureDiscoveryError, IoResultExt, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// PCI vendor id of Rebellions
pub const RBLN_VENDOR_ID: &str = "0x1eff";

/// Default PCI device tree
pub const PCI_DEVICES_PATH: &str = "/sys/bus/pci/devices";

/// Default rebellions device class
pub const REBELLIONS_CLASS_PATH: &str = "/sys/class/rebellions";

/// Device node whose attributes describe the loaded driver
const CANONICAL_DEVICE_NODE: &str = "rbln0";

const KERNEL_VERSION_ATTR: &str = "kernel_version";

/// Reads accelerator facts from kernel-exposed attribute files
#[derive(Debug, Clone)]
pub struct SysfsScanner {
    pci_devices_root: PathBuf,
    class_root: PathBuf,
}

impl Default for SysfsScanner {
    fn default() -> Self {
        Self::new(PCI_DEVICES_PATH, REBELLIONS_CLASS_PATH)
    }
}

impl SysfsScanner {
    /// Create a scanner over custom roots
    pub fn new(pci_devices_root: impl Into<PathBuf>, class_root: impl Into<PathBuf>) -> Self {
        Self {
            pci_devices_root: pci_devices_root.into(),
            class_root: class_root.into(),
        }
    }

    /// PCI device tree this scanner walks
    pub fn pci_devices_root(&self) -> &Path {
        &self.pci_devices_root
    }

    /// Enumerate serviceable RBLN devices.
    ///
    /// Physical functions with SR-IOV enabled are skipped since their
    /// virtual functions are listed separately. Entries are returned in
    /// PCI address order.
    pub fn discover_devices(&self) -> Result<Vec<Device>> {
        let root = &self.pci_devices_root;
        let mut entries = fs::read_dir(root)
            .with_sysfs_path(root)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()
            .with_sysfs_path(root)?;
        entries.sort();

        let mut devices = Vec::new();
        for device_path in entries {
            let vendor_path = device_path.join("vendor");
            let vendor = fs::read_to_string(&vendor_path).with_sysfs_path(&vendor_path)?;
            if vendor.trim() != RBLN_VENDOR_ID {
                continue;
            }

            if Self::sriov_enabled(&device_path) {
                tracing::debug!("Skipping SR-IOV physical function {:?}", device_path);
                continue;
            }

            let device_id_path = device_path.join("device");
            let raw_id = fs::read_to_string(&device_id_path).with_sysfs_path(&device_id_path)?;
            let id = raw_id.trim();
            let id = id.strip_prefix("0x").unwrap_or(id);

            devices.push(Device::new(id));
        }

        Ok(devices)
    }

    /// A missing or unreadable `sriov_numvfs` counts as zero VFs
    fn sriov_enabled(device_path: &Path) -> bool {
        fs::read_to_string(device_path.join("sriov_numvfs"))
            .ok()
            .and_then(|content| content.trim().parse::<u64>().ok())
            .is_some_and(|numvfs| numvfs != 0)
    }

    /// Read the loaded driver's version.
    ///
    /// Returns `Ok(None)` when the attribute does not exist, which is the
    /// normal state of a node with devices but no driver installed.
    pub fn read_driver_version(&self) -> Result<Option<String>> {
        let path = self
            .class_root
            .join(CANONICAL_DEVICE_NODE)
            .join(KERNEL_VERSION_ATTR);

        match fs::metadata(&path) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FeatureDiscoveryError::sysfs(path, e)),
        }

        let version = fs::read_to_string(&path).with_sysfs_path(&path)?;
        Ok(Some(version.trim().to_string()))
    }
}
