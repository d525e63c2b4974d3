pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::database::{assignment_store::PgAssignmentStore, question_store::PgQuestionStore};
use crate::services::{
    question_persister::QuestionPersister, share_link_service::ShareLinkService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub share_links: ShareLinkService<PgAssignmentStore>,
    pub question_persister: QuestionPersister<PgQuestionStore>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let share_links = ShareLinkService::new(
            PgAssignmentStore::new(pool.clone()),
            config.public_origin.clone(),
            config.share_link_ttl_days,
        );
        let question_persister = QuestionPersister::new(PgQuestionStore::new(pool.clone()));

        Self {
            pool,
            share_links,
            question_persister,
        }
    }
}
