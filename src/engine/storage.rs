//! Derived storage layout
//!
//! Translates the chosen install device into the partition paths and btrfs
//! mount options the install script expects.
//!
//! # Layout
//!
//! | Answer               | Value for `/dev/sda` | Value for `/dev/nvme0n1` |
//! |----------------------|----------------------|--------------------------|
//! | `DEVICE`             | `/dev/sda`           | `/dev/nvme0n1`           |
//! | `PARTITION_BIOSBOOT` | `/dev/sda`           | `/dev/nvme0n1`           |
//! | `PARTITION_EFI`      | `/dev/sda2`          | `/dev/nvme0n1p2`         |
//! | `PARTITION_ROOT`     | `/dev/sda3`          | `/dev/nvme0n1p3`         |
//! | `PARTITION_HOME`     | `/dev/sda4`          | `/dev/nvme0n1p4`         |
//! | `PARTITION_SWAP`     | `/dev/sda5`          | `/dev/nvme0n1p5`         |
//! | `MOUNT_OPTIONS`      | `...,nossd,...`      | `...,ssd,...`            |
//!
//! Pure logic: no I/O, and the same device always yields the same layout.

use crate::catalog::{
    DEVICE, MOUNT_OPTIONS, PARTITION_BIOSBOOT, PARTITION_EFI, PARTITION_HOME, PARTITION_ROOT,
    PARTITION_SWAP,
};
use std::fmt;

/// Mount options for solid-state devices
pub const SSD_MOUNT_OPTIONS: &str = "noatime,compress=zstd,ssd,commit=120";

/// Mount options for rotational devices
pub const HDD_MOUNT_OPTIONS: &str = "noatime,compress=zstd,nossd,commit=120";

/// Whether a device name marks a solid-state drive.
///
/// Both the partition suffix and the mount options follow this predicate.
pub fn is_solid_state(device: &str) -> bool {
    device.contains("nvme") || device.contains("ssd")
}

/// Separator between device and partition number (`p` for NVMe/SSD names)
pub fn partition_suffix(device: &str) -> &'static str {
    if is_solid_state(device) { "p" } else { "" }
}

/// Path of partition `number` on `device`
pub fn partition_path(device: &str, number: u32) -> String {
    format!("{}{}{}", device, partition_suffix(device), number)
}

/// Answers derived from the install device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub device: String,
    pub bios_boot: String,
    pub efi: String,
    pub root: String,
    pub home: String,
    pub swap: String,
    pub mount_options: String,
}

impl StorageLayout {
    /// Derive the layout for `device`
    pub fn for_device(device: &str) -> Self {
        let mount_options = if is_solid_state(device) {
            SSD_MOUNT_OPTIONS
        } else {
            HDD_MOUNT_OPTIONS
        };

        Self {
            device: device.to_string(),
            bios_boot: device.to_string(),
            efi: partition_path(device, 2),
            root: partition_path(device, 3),
            home: partition_path(device, 4),
            swap: partition_path(device, 5),
            mount_options: mount_options.to_string(),
        }
    }

    /// Answer ids and values to write into the store
    pub fn to_answers(&self) -> [(&'static str, String); 7] {
        [
            (DEVICE, self.device.clone()),
            (PARTITION_BIOSBOOT, self.bios_boot.clone()),
            (PARTITION_EFI, self.efi.clone()),
            (PARTITION_ROOT, self.root.clone()),
            (PARTITION_HOME, self.home.clone()),
            (PARTITION_SWAP, self.swap.clone()),
            (MOUNT_OPTIONS, self.mount_options.clone()),
        ]
    }
}

impl fmt::Display for StorageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: efi={} root={} home={} swap={} opts={}",
            self.device, self.efi, self.root, self.home, self.swap, self.mount_options
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
