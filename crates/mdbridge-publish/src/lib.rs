//! Publishing converted markdown to Confluence and Jira.
//!
//! Both targets share a blocking `ureq` transport with HTTP basic
//! authentication (`username:api_token`) and a 30 second timeout.
//!
//! - [`confluence`]: find, create and update pages in a space
//! - [`jira`]: create and update issues, add comments, set estimates
//!
//! Publishes to the same page title or issue key are serialized within a
//! process by [`KeyedLocks`].

pub mod confluence;
mod error;
pub mod jira;
mod lock;
mod transport;

pub use error::PublishError;
pub use lock::KeyedLocks;
