mod blob;
mod extractor;
mod union_find;

pub use blob::*;
pub use extractor::*;
