mod interval;

pub use interval::*;
