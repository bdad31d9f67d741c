pub mod domestika;
pub mod traits;
