// src/utils/mod.rs

pub mod identity;
pub mod json;
pub mod value;
