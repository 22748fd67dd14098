pub mod candidates;
pub mod config;
pub mod detect;
pub mod dto;
pub mod error;
pub mod normalize;
pub mod partition;
pub mod pipeline;
pub mod report;
pub mod response;
pub mod score;
pub mod table;
pub mod util;
