use std::sync::Arc;

use crate::{
    auth::{PrincipalResolver, TokenResolver},
    config::Config,
    services::{
        CatalogService, IntegrityEngine, InvitationService, LikeEngine, SrtExporter, ViewerService,
    },
    store::EntityStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: EntityStore,
    pub catalog: CatalogService,
    pub integrity: IntegrityEngine,
    pub invitations: InvitationService,
    pub likes: LikeEngine,
    pub srt: SrtExporter,
    pub viewer: ViewerService,
    pub resolver: Arc<dyn PrincipalResolver>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = EntityStore::new(&config.database.url).await?;
        store.init().await?;

        Ok(Self {
            catalog: CatalogService::new(store.clone()),
            integrity: IntegrityEngine::new(store.clone()),
            invitations: InvitationService::new(store.clone(), config.server.public_url.clone()),
            likes: LikeEngine::new(store.clone()),
            srt: SrtExporter::new(store.clone()),
            viewer: ViewerService::new(store.clone()),
            resolver: Arc::new(TokenResolver::new(store.clone())),
            store,
            config,
        })
    }
}
