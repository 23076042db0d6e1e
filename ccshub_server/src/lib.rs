//! # ccsHub server
//! This crate hosts the HTTP API of the ccsHub backend. It is responsible for:
//! * Authenticating callers, either with a bearer token issued by this server, or through a browser login with an
//!   external OpenID Connect provider.
//! * Deciding, from a single ordered policy table, which callers may reach which routes.
//! * Serving the users, admins, merchandise, events and orders APIs on top of [`ccshub_engine`].
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/auth/*`: Local registration and login.
//! * `/oauth2/authorization/{registration}`, `/login/oauth2/code/{registration}` and `/logout`: the external login
//!   flow.
//! * `/api/users`, `/api/admins`, `/api/merchandises`, `/api/events` and `/api/orders`: the resource APIs.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod oidc;
pub mod passwords;
pub mod policy;
pub mod routes;
pub mod server;
