//! Engagement service: likes, subscriptions, comments and paginated content feeds.
//!
//! Relationship edges are toggled atomically against a storage uniqueness constraint;
//! feeds compose text filter, sort and pagination into one query per collection.

pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod services;

pub use error::{ServiceError, ServiceResult};
