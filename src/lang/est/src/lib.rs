mod est;

pub use est::*;
