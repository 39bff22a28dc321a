// src/services/mod.rs

pub mod grading;
pub mod post;
pub mod quiz;
