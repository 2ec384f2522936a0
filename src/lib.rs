pub mod config;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod pipeline;
pub mod quality;
pub mod schedule;
pub mod storage;
pub mod timing;
pub mod transformer;
