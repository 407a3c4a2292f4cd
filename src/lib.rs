// Library exports for vidshare
// This allows integration tests and external code to use vidshare modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod media;
pub mod repo;
pub mod response;
pub mod routes;
pub mod state;
pub mod views;
