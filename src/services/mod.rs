pub mod link_resolver;
pub mod question_persister;
pub mod share_link_service;
