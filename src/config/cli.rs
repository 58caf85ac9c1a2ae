use crate::config::toml_config::TomlConfig;
use crate::domain::model::{ExportFormat, NewCard};
use crate::utils::error::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "card-etl")]
#[command(about = "Import, export and manage business cards")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override storage.data_dir from config
    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Import cards from a .csv or .xml file
    Import {
        file: PathBuf,
    },
    /// Export cards as CSV or XML
    Export {
        /// Card IDs to export (all cards when omitted)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<i64>,

        #[arg(long)]
        format: Option<ExportFormat>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List all cards
    List,
    /// Show one card
    Show {
        id: i64,
    },
    /// Soft-delete a card
    Delete {
        id: i64,
    },
    /// Create a card from command line values
    Create(CreateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub gender: String,
    /// Date of birth (yyyy-MM-dd)
    #[arg(long)]
    pub date_of_birth: NaiveDate,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub address: String,
    /// Base64 image, optionally prefixed with `data:<mime>;base64,`
    #[arg(long)]
    pub image: Option<String>,
}

impl From<CreateArgs> for NewCard {
    fn from(args: CreateArgs) -> Self {
        Self {
            name: args.name,
            gender: args.gender,
            date_of_birth: args.date_of_birth,
            email: args.email,
            phone: args.phone,
            image: args.image,
            address: args.address,
        }
    }
}

impl CliConfig {
    /// 載入配置檔 (若有指定) 並套用命令列覆蓋
    pub fn resolve_config(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
        if self.json_logs {
            config.logging.json = true;
        }

        Ok(config)
    }
}
