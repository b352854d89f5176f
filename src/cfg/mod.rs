// src/cfg/mod.rs
pub mod connection;
pub mod field;
pub mod net_cfg;
pub mod portal;
