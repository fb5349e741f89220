pub mod spatial;
pub mod statistics;
