mod interpolator;

pub use interpolator::{Correction, Interpolator, RotationInterpolator, VectorInterpolator};
