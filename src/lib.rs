//! Library crate for match-tracker-back: live event capture, offline sync and
//! post-match analytics for Gaelic games fixtures.

pub mod analytics;
pub mod client;
pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod events;
pub mod routes;
pub mod services;
pub mod state;
