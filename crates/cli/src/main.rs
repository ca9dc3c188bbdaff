use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use glossa_core::lexical::CaseInsensitiveMatch;
use glossa_core::{GradingConfig, GradingEngine, VersionStore, VersioningEngine};
use glossa_db::{DbConfig, PgVersionStore};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "glossa_cli=info,glossa_core=info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let cli = Cli::parse();

    // --- Configuration ---
    let grading_config = load_grading_config(&cli)?;
    let db_config = DbConfig::from_env()?;

    // --- Database ---
    let pool = glossa_db::create_pool(&db_config)
        .await
        .context("Failed to connect to database")?;
    glossa_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!(
        max_connections = db_config.max_connections,
        "Database connection pool created"
    );

    if let Command::Migrate = cli.command {
        glossa_db::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations applied");
        return Ok(());
    }

    // --- Engines ---
    let store: Arc<dyn VersionStore> = Arc::new(PgVersionStore::new(pool));
    let versioning = VersioningEngine::new(Arc::clone(&store));
    let grading = GradingEngine::new(store, Arc::new(CaseInsensitiveMatch), grading_config)?;

    match cli.command {
        Command::Migrate => {}
        Command::Create {
            content_id,
            data,
            author,
            change_type,
        } => {
            let content_data = serde_json::from_str(&data).context("--data must be valid JSON")?;
            let version = versioning
                .create_version(content_id, content_data, &author, change_type.map(Into::into))
                .await?;
            print_json(&version)?;
        }
        Command::Branch { base_id, author } => {
            print_json(&versioning.branch_version(base_id, &author).await?)?;
        }
        Command::Merge {
            source_id,
            target_id,
            author,
        } => {
            let merged = versioning
                .merge_versions(source_id, target_id, author.as_deref())
                .await?;
            print_json(&merged)?;
        }
        Command::Revert { target_id, author } => {
            print_json(&versioning.revert_version(target_id, &author).await?)?;
        }
        Command::Publish { version_id, author } => {
            print_json(&versioning.publish_version(version_id, &author).await?)?;
        }
        Command::History { content_id } => {
            print_json(&versioning.get_history(content_id).await?)?;
        }
        Command::Compare { from, to } => {
            print_json(&versioning.compare_versions(from, to).await?)?;
        }
        Command::Grade { version_id, apply } => {
            let version = versioning.get_version(version_id).await?;
            let result = grading.grade(&version).await?;
            if apply {
                let pass_score = grading.config().validation_pass_score;
                versioning
                    .apply_grading(version_id, &result, pass_score)
                    .await?;
            }
            print_json(&result)?;
        }
        Command::Approve { version_id, revoke } => {
            let version = versioning
                .set_community_approval(version_id, !revoke)
                .await?;
            print_json(&version)?;
        }
        Command::Parents { version_id } => {
            print_json(&versioning.lineage_parents(version_id).await?)?;
        }
        Command::Remove { version_id } => {
            versioning.remove_version(version_id).await?;
            tracing::info!(%version_id, "Version removed");
        }
    }

    Ok(())
}

/// Defaults, overlaid with the JSON file passed via `--grading-config`.
fn load_grading_config(cli: &Cli) -> anyhow::Result<GradingConfig> {
    let Some(path) = &cli.grading_config else {
        return Ok(GradingConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: GradingConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid grading configuration in {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded grading configuration");
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
