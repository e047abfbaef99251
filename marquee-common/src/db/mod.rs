//! Shared database schema for Marquee services

pub mod init;
