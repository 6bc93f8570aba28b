// src/models/mod.rs

pub mod question;
pub mod result_record;
pub mod session;
