pub mod ride;
pub mod vehicle;
