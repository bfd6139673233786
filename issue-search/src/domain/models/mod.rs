mod attribute;
mod caller;
mod issue;
mod limits;
mod project;
mod raw_issue;
mod request;
mod result;

pub use attribute::*;
pub use caller::*;
pub use issue::*;
pub use limits::*;
pub use project::*;
pub use raw_issue::*;
pub use request::*;
pub use result::*;
