//! Domain models for device classification and identifier resolution.

pub mod classification;
pub mod device_type;
pub mod resolution;
