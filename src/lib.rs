pub mod config;
pub mod dataset;
pub mod export;
pub mod features;
pub mod head_to_head;
pub mod pipeline;
pub mod rating;
pub mod records;
pub mod rolling;
pub mod score;
