//! Core types and services for the Shelf book-tracking feed.
//!
//! This crate is free of HTTP and database dependencies. Storage and the
//! remote book catalog are reached through the [`store::SocialStore`] and
//! [`catalog::CatalogSource`] traits; concrete backends live in sibling
//! crates.

// Native `async fn` in traits; the futures' `Send` bounds are spelled out on
// the trait methods that need them.
#![allow(async_fn_in_trait)]

pub mod book;
pub mod cache;
pub mod catalog;
pub mod error;
pub mod like;
pub mod likes;
pub mod locks;
pub mod post;
pub mod store;
pub mod user;

pub use error::{Error, Result};
