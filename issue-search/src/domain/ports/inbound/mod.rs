mod issue_search;

pub use issue_search::*;
