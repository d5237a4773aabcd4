pub mod catalog;
pub mod checksum;
pub mod commands;
pub mod download;
pub mod game;
pub mod http;
pub mod package;
pub mod runtime;
pub mod sync;
