pub mod classifier;
pub mod executor;
pub mod file_service;
pub mod poller;
pub mod transfer;
pub mod upload_service;
