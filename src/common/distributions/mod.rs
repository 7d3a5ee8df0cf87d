// Burn has very limited support for distributions, especially
// when compared to TensorFlow Probability. The policy only needs a
// standard normal base pushed through a handful of bijectors, so
// that is what lives here.

pub mod bijector;
pub mod distribution;
pub mod normal;
pub mod transformed;
