mod db;
mod schema;

pub mod models;

pub use db::*;
pub use models::*;
