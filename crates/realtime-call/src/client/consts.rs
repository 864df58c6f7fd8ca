pub const CALL_SERVICE_API_KEY: &str = "CALL_SERVICE_API_KEY";
pub const CALL_SERVICE_URL: &str = "CALL_SERVICE_URL";

pub const BASE_URL: &str = "ws://127.0.0.1:8787";
pub const CALL_PATH: &str = "call";

pub const AUTHORIZATION_HEADER: &str = "Authorization";
