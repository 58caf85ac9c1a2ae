use anyhow::Context;
use card_etl::config::Command;
use card_etl::domain::ports::ConfigProvider;
use card_etl::utils::{logger, validation::Validate};
use card_etl::{CardError, CardService, CliConfig, InMemoryCardRepository, LocalStorage, TomlConfig};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    logger::init_cli_logger(cli.verbose, config.logging.json, config.logging.level.as_deref());
    tracing::info!("Starting card-etl");
    tracing::debug!("Effective config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    match run(cli.command, &config).await {
        Ok(()) => Ok(()),
        Err(RunError::Card(e)) => {
            tracing::error!("❌ {} (Category: {:?})", e, e.category());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
        Err(RunError::Other(e)) => Err(e),
    }
}

enum RunError {
    Card(CardError),
    Other(anyhow::Error),
}

impl From<CardError> for RunError {
    fn from(e: CardError) -> Self {
        Self::Card(e)
    }
}

impl From<anyhow::Error> for RunError {
    fn from(e: anyhow::Error) -> Self {
        Self::Other(e)
    }
}

async fn run(command: Command, config: &TomlConfig) -> Result<(), RunError> {
    let storage = LocalStorage::new(config.data_dir());
    let repository = Arc::new(InMemoryCardRepository::load(&storage, config.cards_file()).await?);
    let service = CardService::with_max_image_bytes(repository.clone(), config.max_image_bytes());

    let mut dirty = false;
    match command {
        Command::Import { file } => {
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read import file {}", file.display()))?;
            let file_name = file.to_string_lossy();

            let outcome = service.import_file(&file_name, &content).await;
            dirty = outcome.total_count > 0;

            if !outcome.errors.is_empty() {
                tracing::warn!("⚠️ {} errors during import", outcome.errors.len());
            }
            print_json(&outcome)?;
        }
        Command::Export { ids, format, output } => {
            let format = match format {
                Some(format) => format,
                None => config.export_format()?,
            };
            let bytes = if ids.is_empty() {
                service.export_all(format).await?
            } else {
                service.export_cards(&ids, format).await?
            };

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &bytes)
                        .await
                        .with_context(|| format!("Failed to write export to {}", path.display()))?;
                    tracing::info!("📁 Export saved to: {}", path.display());
                }
                None => {
                    use std::io::Write;
                    std::io::stdout()
                        .write_all(&bytes)
                        .context("Failed to write export to stdout")?;
                }
            }
        }
        Command::List => print_json(&service.list_cards().await?)?,
        Command::Show { id } => print_json(&service.get_card(id).await?)?,
        Command::Delete { id } => {
            if !service.delete_card(id).await? {
                return Err(CardError::NotFound { id }.into());
            }
            dirty = true;
            println!("Card {} deleted", id);
        }
        Command::Create(args) => {
            let card = service.create_card(args.into()).await?;
            dirty = true;
            print_json(&card)?;
        }
    }

    if dirty {
        repository.save(&storage, config.cards_file()).await?;
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), RunError> {
    let json = serde_json::to_string_pretty(value).map_err(CardError::from)?;
    println!("{}", json);
    Ok(())
}
