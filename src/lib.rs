//! Drip: a terminal client for a token faucet and a demo counter contract

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod dapp;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod modules;
pub mod ui;
