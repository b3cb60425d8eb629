pub mod errors;
pub mod config;
pub mod sketch;
pub mod lora_helpers;
pub mod lora_drivers;
pub mod threshold;
pub mod test_assist;

pub use config::{RsvdConfig, Stabilizer};
pub use errors::{RandSvdError, Result};
pub use lora_drivers::{rand_svd, DecompositionResult};
pub use threshold::{optimal_rank, optimal_threshold, optimal_threshold_for_ratio, NoiseLevel};
