// src/lib.rs

//! Coursemap: an interactive query shell over a university course catalog.

pub mod client;
pub mod error;
pub mod models;
pub mod services;
pub mod shell;
pub mod storage;
pub mod utils;
