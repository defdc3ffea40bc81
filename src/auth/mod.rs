//! Authentication module
//!
//! This module provides authentication functionality including:
//! - Invite-only registration and login
//! - JWT token generation and validation
//! - Password hashing and verification
//! - Authentication middleware

pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use handlers::{get_me, login, register};
pub use jwt::{generate_token, validate_token, Claims};
pub use middleware::{authenticate, AuthUser};
pub use password::{hash_password, verify_password};
