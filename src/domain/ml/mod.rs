pub mod scaling;
pub mod windowing;
