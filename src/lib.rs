pub mod core;
pub mod customers;
pub mod dashboards;
pub mod main_module;
pub mod messages;
pub mod security;
pub mod tickets;

pub use crate::core::config::AppConfig;
pub use crate::core::shared::state::AppState;
pub use crate::core::shared::{CrmError, CrmResult};
pub use crate::main_module::{build_router, run_axum_server};
