pub mod company;
pub mod event;

pub use company::*;
pub use event::*;
