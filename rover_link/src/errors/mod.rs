mod link_error;

pub use link_error::*;
