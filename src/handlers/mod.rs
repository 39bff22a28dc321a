// src/handlers/mod.rs

pub mod community;
pub mod health;
pub mod quiz;
pub mod result;
