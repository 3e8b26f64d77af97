pub mod client;
pub mod error;
pub mod fan_out;
pub mod filter;
pub mod observation;
pub mod report;
pub mod station;
pub mod table;
