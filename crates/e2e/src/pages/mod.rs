//! Storefront page objects
//!
//! [`StoreClient`] owns the browser page for one scenario. Capabilities are
//! split into [`BaseActions`] (site-wide) and [`ShoppingActions`]
//! (cart, checkout, order history); scenarios ask for the traits they need.

pub mod base;
pub mod client;
pub mod selectors;
pub mod shopping;

pub use base::BaseActions;
pub use client::{StoreClient, Timeouts};
pub use shopping::ShoppingActions;
