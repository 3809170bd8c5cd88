// Startup bootstrap: the placeholder user always exists, and the optional
// reset flag wipes the store and seeds a demo workspace. Both run exactly
// once during process initialization.

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Class, Role, User, Workspace};
use crate::services::integrity::ensure_sentinel;
use crate::store::EntityStore;

pub async fn bootstrap(store: &EntityStore, config: &Config) -> anyhow::Result<()> {
    if config.startup.reset_db_on_boot {
        warn!("RESET_DB_ON_BOOT is set: wiping all collections");
        store.clear_all().await?;
    }

    let mut tx = store.begin().await?;
    ensure_sentinel(&mut tx)
        .await
        .map_err(|e| anyhow::anyhow!("sentinel bootstrap failed: {}", e))?;
    tx.commit().await?;

    if config.startup.reset_db_on_boot {
        seed_demo_data(store).await?;
    }

    Ok(())
}

async fn seed_demo_data(store: &EntityStore) -> anyhow::Result<()> {
    let mut teacher = User::new(
        "Demo Teacher".to_string(),
        "teacher@example.com".to_string(),
        "demo-hash".to_string(),
        Role::Teacher,
    );
    teacher.access_token = Some(Uuid::new_v4().to_string());

    let workspace = Workspace::new("Demo Workspace".to_string(), teacher.id);
    teacher.workspaces.insert(workspace.id);

    let class = Class::new("Demo Class".to_string(), workspace.id);

    let mut tx = store.begin().await?;
    tx.insert(&teacher).await?;
    tx.insert(&workspace).await?;
    tx.insert(&class).await?;
    tx.commit().await?;

    info!(teacher_id = %teacher.id, workspace_id = %workspace.id, "demo data seeded");
    Ok(())
}
