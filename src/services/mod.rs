pub mod auth;
pub mod ingredient;
pub mod recipe;
