//! Byte counters for virtual-media sessions
//!
//! The media engine reports block operations in sectors. The aggregator
//! converts them to bytes per device class and direction.

use serde::{Deserialize, Serialize};

/// Virtual media device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    /// Floppy image, 512-byte sectors
    Floppy,
    /// Optical image, 2048-byte sectors
    Optical,
}

impl DeviceClass {
    /// Sector size in bytes
    pub const fn sector_size(&self) -> u64 {
        match self {
            DeviceClass::Floppy => 512,
            DeviceClass::Optical => 2048,
        }
    }

    /// Decodes the engine's raw device code (0 = floppy)
    pub fn from_raw(code: u8) -> Self {
        if code == 0 {
            DeviceClass::Floppy
        } else {
            DeviceClass::Optical
        }
    }
}

/// Block transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoDirection {
    /// Device read from the console's image
    Read,
    /// Device wrote to the console's image
    Write,
}

impl IoDirection {
    /// Decodes the engine's raw mode code (1 = read)
    pub fn from_raw(code: u8) -> Self {
        if code == 1 {
            IoDirection::Read
        } else {
            IoDirection::Write
        }
    }
}

/// One block operation as reported by the media engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorOperation {
    /// Transfer direction
    pub direction: IoDirection,
    /// Device the operation targeted
    pub device: DeviceClass,
    /// Total sectors on the device
    pub total_sectors: u64,
    /// First sector of the operation
    pub start_sector: u64,
    /// Number of sectors transferred
    pub length: u64,
}

impl SectorOperation {
    /// Builds an operation from the engine's raw callback arguments
    pub fn from_raw(mode: u8, device: u8, total_sectors: u64, start_sector: u64, length: u64) -> Self {
        Self {
            direction: IoDirection::from_raw(mode),
            device: DeviceClass::from_raw(device),
            total_sectors,
            start_sector,
            length,
        }
    }

    /// Bytes moved by this operation
    pub fn bytes(&self) -> u64 {
        self.length.saturating_mul(self.device.sector_size())
    }
}

/// Immutable view of all four counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    /// Bytes read from the floppy image
    pub floppy_read: u64,
    /// Bytes written to the floppy image
    pub floppy_write: u64,
    /// Bytes read from the optical image
    pub cdrom_read: u64,
    /// Bytes written to the optical image
    pub cdrom_write: u64,
}

impl StatisticsSnapshot {
    /// Counter for one device class and direction
    pub fn bytes(&self, device: DeviceClass, direction: IoDirection) -> u64 {
        match (device, direction) {
            (DeviceClass::Floppy, IoDirection::Read) => self.floppy_read,
            (DeviceClass::Floppy, IoDirection::Write) => self.floppy_write,
            (DeviceClass::Optical, IoDirection::Read) => self.cdrom_read,
            (DeviceClass::Optical, IoDirection::Write) => self.cdrom_write,
        }
    }
}

/// Per-session accumulator; a new session gets a new aggregator
#[derive(Debug, Clone, Default)]
pub struct StatisticsAggregator {
    counters: StatisticsSnapshot,
    operations: u64,
}

impl StatisticsAggregator {
    /// Creates an aggregator with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `sectors` worth of bytes to one counter and returns the new snapshot
    pub fn record_operation(
        &mut self,
        direction: IoDirection,
        device: DeviceClass,
        sectors: u64,
    ) -> StatisticsSnapshot {
        let bytes = sectors.saturating_mul(device.sector_size());
        let counter = match (device, direction) {
            (DeviceClass::Floppy, IoDirection::Read) => &mut self.counters.floppy_read,
            (DeviceClass::Floppy, IoDirection::Write) => &mut self.counters.floppy_write,
            (DeviceClass::Optical, IoDirection::Read) => &mut self.counters.cdrom_read,
            (DeviceClass::Optical, IoDirection::Write) => &mut self.counters.cdrom_write,
        };
        *counter = counter.saturating_add(bytes);
        self.operations += 1;
        self.counters
    }

    /// Records an engine-reported operation
    pub fn record(&mut self, operation: &SectorOperation) -> StatisticsSnapshot {
        self.record_operation(operation.direction, operation.device, operation.length)
    }

    /// Current counters
    pub fn snapshot(&self) -> StatisticsSnapshot {
        self.counters
    }

    /// Number of operations recorded
    pub fn operations(&self) -> u64 {
        self.operations
    }
}
