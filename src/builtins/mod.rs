// ABOUTME: The fixed builtin registry — host procedures installed into the root
// environment at pool construction time.

use crate::pool::Pool;

pub mod arithmetic;
pub mod comparison;
pub mod console;
pub mod lists;
pub mod logic;
pub mod types;

/// Install every builtin into the pool's root environment. Called once from
/// [`Pool::new`](crate::pool::Pool::new) and again by
/// [`Pool::env_reset`](crate::pool::Pool::env_reset).
pub fn register_all(pool: &mut Pool) {
    arithmetic::register(pool);
    comparison::register(pool);
    logic::register(pool);
    types::register(pool);
    lists::register(pool);
    console::register(pool);
}
