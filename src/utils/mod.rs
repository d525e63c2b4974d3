pub mod share_token;
pub mod time;
