// handlers/mod.rs - Route handlers
//
// home:     GET /, GET /health (public)
// missions: GET /missions, GET /missions/:missionid (session + resource token)
// auth:     GET /login, GET /auth/callback, GET /logout (sign-in round trip)

pub mod auth;
pub mod home;
pub mod missions;
