// Playback core shared by the CLI binary and embedding hosts

#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod constants;
pub mod models;
pub mod player;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod test_utils;
