pub mod case_store;
pub mod db;
