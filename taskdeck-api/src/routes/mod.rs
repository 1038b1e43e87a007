/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication and profile endpoints
/// - `tasks`: Task CRUD and statistics
/// - `admin`: Admin panel (user management, platform stats)

pub mod admin;
pub mod auth;
pub mod health;
pub mod tasks;
