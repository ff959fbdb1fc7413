pub mod aws;
pub mod config;
pub mod enumerate;
pub mod errors;
pub mod model;
pub mod publish;
pub mod report;
pub mod service;
pub mod signin;
