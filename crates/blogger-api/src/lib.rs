pub mod auth;
pub mod blogs;
pub mod config;
pub mod engagement;
pub mod error;
pub mod middleware;
pub mod notifications;
pub mod password;
pub mod routes;
pub mod state;
pub mod tokens;
pub mod users;
pub mod validation;
pub mod views;
