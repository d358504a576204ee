pub mod aggregation;
pub mod catalog;
pub mod config;
pub mod db;
pub mod environment;
pub mod errors;
pub mod metadata;
pub mod recommendation;
pub mod routes;
pub mod session;
pub mod testing;
pub mod video;
pub mod vote;
