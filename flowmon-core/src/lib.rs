pub mod config;
pub mod dat_file;
pub mod error;
pub mod estimator;
pub mod sample;
