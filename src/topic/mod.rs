// src/topic/mod.rs
pub mod registry;
pub mod topics;
