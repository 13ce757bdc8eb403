use anyhow::{bail, Context};
use client_core::observability::init_tracing;
use document_manager::models::{EntityRef, FilePayload};
use document_manager::services::{
    HttpDocumentClient, HttpTokenProvider, NotifyingErrorHandler, StaticPermissions,
    TracingNotifier,
};
use document_manager::view::rows;
use document_manager::{Collaborators, DocumentManager, ManagerConfig, ManagerOptions, Outcome};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ManagerConfig::load().context("Failed to load configuration")?;
    init_tracing("document-manager", &config.log_level);

    let mut args = std::env::args().skip(1);
    let (Some(entity_type), Some(entity_id)) = (args.next(), args.next()) else {
        bail!("usage: document-manager <entity-type> <entity-id> [file-to-upload]");
    };
    let upload_path = args.next();

    let notifier = Arc::new(TracingNotifier);
    let collaborators = Collaborators {
        transport: Arc::new(HttpDocumentClient::from_config(&config)?),
        tokens: Arc::new(HttpTokenProvider::from_config(&config)?),
        permissions: Arc::new(StaticPermissions::new(config.granted_roles.iter().cloned())),
        notifier: notifier.clone(),
        errors: Arc::new(NotifyingErrorHandler::new(notifier)),
    };
    let options = ManagerOptions::from_config(&config)?;

    let manager = DocumentManager::new(EntityRef::new(entity_id, entity_type), options, collaborators);

    let state = manager.wait_for(|state| !state.documents.is_loading).await;
    if let Some(e) = &state.documents.error {
        bail!("Failed to list documents: {e}");
    }

    println!("{} document(s)", state.documents.total_count);
    for row in rows(&state.documents.items) {
        let record = row.record();
        let link = manager
            .download_url(record)
            .map(|url| url.to_string())
            .unwrap_or_default();
        println!(
            "{}\t{}\t{}\t{} bytes\t{}",
            row.file_uuid(),
            record.file_type,
            record.name,
            record.size,
            link
        );
    }

    if let Some(path) = upload_path {
        let file = FilePayload::from_path(&path)
            .await
            .with_context(|| format!("Failed to read {path}"))?;
        let handle = manager.upload_file(file)?;

        match handle.outcome().await {
            Outcome::Succeeded => println!("Uploaded {path}"),
            Outcome::Failed(e) => bail!("Upload failed: {e}"),
            other => println!("Upload {}", other.as_str()),
        }
    }

    Ok(())
}
