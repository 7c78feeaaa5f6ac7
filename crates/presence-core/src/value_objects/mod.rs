//! Value objects - immutable domain primitives

mod device;
mod entity;
mod status;

pub use device::DeviceType;
pub use entity::{EntityKind, EntityRef};
pub use status::{PresenceStatus, StatusParseError};
