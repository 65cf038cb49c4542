pub mod active_bids;
pub mod api;
pub mod auction;
pub mod config;
pub mod countdown;
pub mod event;
pub mod event_log;
pub mod profile;
pub mod ranking;
pub mod service;
pub mod session;
