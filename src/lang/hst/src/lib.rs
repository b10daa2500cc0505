mod hst;
mod fragments;
pub use hst::*;
pub use fragments::*;
