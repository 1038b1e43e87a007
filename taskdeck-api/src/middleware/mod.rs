/// HTTP middleware for the API server
///
/// # Modules
///
/// - `security`: Response security headers
///
/// Authentication and the admin gate live in [`crate::app`] as
/// `from_fn` layers since they need application state.

pub mod security;
