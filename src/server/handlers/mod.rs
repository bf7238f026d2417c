pub mod fares;
pub mod trips;
