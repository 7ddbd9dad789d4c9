pub mod configuration;
pub use configuration::*;

pub mod error_handling;

pub mod storage;

pub mod feed;
pub use feed::FeedAssembler;

pub mod identity;

pub mod web_interface;
pub use web_interface::WebServer;
