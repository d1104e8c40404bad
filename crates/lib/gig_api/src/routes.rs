//! Route table paths.

pub const POST_AUTH_REGISTER: &str = "/auth/register";
pub const POST_AUTH_LOGIN: &str = "/auth/login";
pub const GET_AUTH_LOGOUT: &str = "/auth/logout";
pub const GET_TEST: &str = "/test/get";
