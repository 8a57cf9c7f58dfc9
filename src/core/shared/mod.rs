pub mod error;
pub mod schema;
pub mod state;
pub mod utils;

pub use error::{CrmError, CrmResult};
pub use schema::*;
