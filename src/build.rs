mod builder;
mod document;
pub mod format;
mod markdown;
mod media;
mod org;
mod paths;
mod render;
pub mod source;
mod template;
mod tree;

pub use builder::Builder;
pub use source::FailurePolicy;
