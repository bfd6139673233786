mod access;
mod attributes;
mod restricted_view;
mod search_backend;

pub use access::*;
pub use attributes::*;
pub use restricted_view::*;
pub use search_backend::*;
