pub mod json;
pub mod method;
pub mod user_id;

pub use json::ValidatedJson;
pub use method::json_method_not_allowed;
pub use user_id::UserId;
