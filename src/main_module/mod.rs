//! HTTP surface: health probe, router assembly and the serve loop

mod health;
mod server;
mod shutdown;

pub use health::*;
pub use server::*;
pub use shutdown::*;
