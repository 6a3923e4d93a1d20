//! Hub registries
//!
//! Read-only snapshots of the registries the grouping engine consults:
//! - Devices (DeviceRegistry)
//! - Areas (AreaRegistry)
//!
//! Both are built from the JSON the hub's registry API or storage files
//! produce and are never written back.

mod error;

pub mod area_registry;
pub mod device_registry;

pub use error::{RegistryError, RegistryResult};

pub use device_registry::{DeviceConnection, DeviceEntry, DeviceIdentifier, DeviceRegistry};

pub use area_registry::{AreaEntry, AreaRegistry};
