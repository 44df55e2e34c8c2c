//! Route paths.
//!
//! Every route is served at the root and again under [`API_PREFIX`].

pub const API_PREFIX: &str = "/api";

pub const GET_HEALTH: &str = "/health";
pub const POST_LOGIN: &str = "/login";
pub const POST_CHAT: &str = "/chat";
