mod handler;
pub mod model;

pub use handler::{create_friendship, list_friends, possible_friends, register};
