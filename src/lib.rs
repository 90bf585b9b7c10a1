pub mod api;
pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod form;
pub mod http;
pub mod models;
pub mod session;
pub mod storage;
