mod eir;
mod constants;
mod intrinsics;
pub use eir::*;
pub use constants::*;
pub use intrinsics::*;

pub mod globals_analysis;
