pub mod client;
pub mod link;
pub mod types;
