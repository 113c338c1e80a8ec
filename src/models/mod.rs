pub mod operation;
pub mod wire;

pub use operation::*;
pub use wire::*;
