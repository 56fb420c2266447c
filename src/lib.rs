//! Blog Post Sync - keeps a README's "latest posts" section in step with a feed
//!
//! This crate fetches an RSS or Atom feed, keeps the newest few entries and
//! rewrites the text between two marker comments in a document. Runs are
//! idempotent: an unchanged feed leaves the document untouched.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod normalizer;
pub mod parser;
pub mod region;
pub mod render;
pub mod sync;
