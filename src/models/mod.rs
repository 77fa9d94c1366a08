pub mod hike;
pub mod quote;
pub mod review;
pub mod session;
pub mod user;
