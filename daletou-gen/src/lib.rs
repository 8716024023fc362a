pub mod analysis;
pub mod config;
pub mod constraints;
pub mod error;
pub mod generator;
pub mod pool;
pub mod sampler;

pub use config::{Block, GeneratorConfig};
pub use constraints::ConstraintSpec;
pub use error::{GenerateError, Result};
pub use generator::{Generation, Generator, StopReason};
pub use pool::PoolOverrides;
