// src/models/mod.rs

pub mod admin_action;
pub mod item;
pub mod redemption;
pub mod swap;
pub mod user;
