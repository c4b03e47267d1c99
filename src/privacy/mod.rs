pub mod generalization;
pub mod noise;
pub mod recoding;
pub mod suppression;
pub mod swapping;

pub use generalization::{generalize, GeneralizationRule, GeneralizeMode, RangeBand};
pub use noise::{add_noise, add_noise_with_summary, NoiseMechanism};
pub use recoding::{pseudonymize, RecodeRegistry, ValueRecoder};
pub use suppression::suppress;
pub use swapping::{swap, swap_with_rng};
