//! Pokefinder - Pokemon lookup TUI
//!
//! The library exposes the fetch/cache/search pipeline and the views so they
//! can be exercised without a terminal.

pub mod action;
pub mod api;
pub mod config;
pub mod effect;
pub mod reducer;
pub mod search;
pub mod service;
pub mod state;
pub mod ui;
pub mod weakness;
