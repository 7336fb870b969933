pub mod money;
pub mod transaction;
