//! Classification and resolution services.

pub mod ascii_decoder;
pub mod cache;
pub mod classifier;
pub mod lookup;
pub mod matcher;
pub mod resolver;
pub mod taxonomy;
