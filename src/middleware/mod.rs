pub mod response;
pub mod session;

pub use response::ApiResponse;
pub use session::{
    challenge_cookie, challenge_cookie_name, clear_challenge_cookie, clear_session_cookie, read_cookie,
    session_cookie, session_middleware,
};
