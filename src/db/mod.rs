pub mod connection;
pub mod listings;
pub mod meta;
pub mod runs;
