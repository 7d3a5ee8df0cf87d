pub mod distributions;
pub mod error;
pub mod logger;
pub mod spaces;
pub mod to_tensor;
pub mod utils;
