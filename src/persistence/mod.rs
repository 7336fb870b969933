//! Database layer: pool, migrations, and access for users, holdings, history.

mod history;
mod holdings;
mod pool;
mod users;

pub use history::{insert_history, list_history_for_user, HistoryRow};
pub use holdings::{
    add_to_holding, delete_holding, get_holding, list_holdings_for_user, reduce_holding,
    HoldingRow,
};
pub use pool::{create_pool_and_migrate, run_migrations};
pub use sqlx::SqlitePool;
pub use users::{adjust_cash, get_cash, get_user_by_id, get_user_by_username, insert_user, UserRow};
