pub mod composer;
pub mod config;
pub mod constraint;
pub mod error;
pub mod fork;
pub mod git;
pub mod github;
pub mod identifier;
pub mod io;
pub mod paths;
pub mod php;
pub mod remote;
pub mod resolver;
pub mod version;

pub use error::{Result, SsdevError};
