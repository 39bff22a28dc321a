// src/models/mod.rs

pub mod post;
pub mod question;
pub mod quiz;
pub mod result;
