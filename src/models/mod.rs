pub mod assignment;
pub mod question;
