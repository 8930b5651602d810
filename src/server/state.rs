use axum::extract::FromRef;

use crate::query::QueryService;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type SharedQueryService = Arc<QueryService>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub query_service: SharedQueryService,
    pub hash: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, query_service: SharedQueryService) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            query_service,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

impl FromRef<ServerState> for SharedQueryService {
    fn from_ref(input: &ServerState) -> Self {
        input.query_service.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
