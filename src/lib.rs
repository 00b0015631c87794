//! Offset pagination over relational collections, with a stable primary key
//! tie-break, post-processing hooks and a small article service built on top.

pub mod collection;
pub mod config;
pub mod controllers;
pub mod db_config;
pub mod models;
pub mod pagination;
pub mod query;
pub mod routes;
