pub mod app;
pub mod ckan;
pub mod config;
pub mod domain;
pub mod embargo;
pub mod error;
pub mod grouping;
pub mod ncbi;
pub mod output;
pub mod project;
pub mod store;
