//! Confluence page publishing.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use mdbridge_markup::WikiOptions;
//! use mdbridge_publish::confluence::{ConfluenceClient, PagePublisher};
//!
//! let client = ConfluenceClient::new(
//!     "https://example.atlassian.net/wiki",
//!     "me@example.com",
//!     "api-token",
//!     "DOCS",
//! );
//! let publisher = PagePublisher::new(&client, WikiOptions::default());
//!
//! let result = publisher.publish("Guide", "# Guide\n\nContent", Some("Handbook"))?;
//! println!("{} {}", result.action, result.url);
//! # Ok(())
//! # }
//! ```

mod client;
mod publisher;
mod types;

pub use client::ConfluenceClient;
pub use publisher::{DryRunResult, PagePublisher, PublishAction, PublishResult};
pub use types::{Links, Page, PageSearch, Version};
