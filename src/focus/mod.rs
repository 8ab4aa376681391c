//! Focus capability and scope bookkeeping
//!
//! - [`graph`] - what the host's spatial navigation must offer
//! - [`scope`] - overlay scopes stacked above the root
//! - [`list`] - a linear graph for hosts without spatial layout

pub mod graph;
pub mod list;
pub mod scope;
