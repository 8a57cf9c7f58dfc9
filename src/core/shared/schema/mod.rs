pub mod crm;
pub use self::crm::*;

diesel::allow_tables_to_appear_in_same_query!(tickets, customers, messages);
