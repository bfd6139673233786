//! The search pipeline.
//!
//! - [`rewriter`] composes the augmented query from the base expression and
//!   request refinements.
//! - [`sort`] validates caller sort keys against an allow-list.
//! - [`source`] puts the primary backend and the restricted view behind one
//!   paging contract.
//! - [`executor`] fetches and projects pages.
//! - [`fallback`] decides when the restricted view serves a request.
//! - [`facets`] scans the matching set for dropdown values.
//! - [`assembler`] builds the response.

pub mod assembler;
pub mod executor;
pub mod facets;
pub mod fallback;
pub mod projection;
pub mod rewriter;
pub mod sort;
pub mod source;
