#![deny(warnings)]

pub mod catalog;
pub mod config;
pub mod matcher;
pub mod search;
