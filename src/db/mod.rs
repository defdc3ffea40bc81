//! Database module
//!
//! This module provides database management functionality including:
//! - Database connection pool management
//! - Repository implementations for users and the cover cache
//! - Database migrations
//! - Data models and schemas

pub mod manager;
pub mod migrations;
pub mod models;
pub mod repository;

pub use manager::DatabaseManager;
pub use models::{CoverRecord, User};
pub use repository::{CoverRepository, UserRepository};
