pub mod cleanup;
pub mod db;
pub mod list;
pub mod setup;
pub mod sync;
