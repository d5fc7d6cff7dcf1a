#![cfg(test)]

pub mod boot_tests;
pub mod common;
pub mod serve_tests;
