#![allow(dead_code)]

pub mod command;
pub mod file;

/// Fixed identity so commit ids are reproducible within a test
pub const AUTHOR_NAME: &str = "fake_user";
pub const AUTHOR_EMAIL: &str = "fake_email@email.com";
pub const AUTHOR_DATE: &str = "1672574400 +0000";
