pub mod catalog;
pub mod github;
pub mod webapp;

pub use catalog::*;
pub use github::*;
pub use webapp::*;
