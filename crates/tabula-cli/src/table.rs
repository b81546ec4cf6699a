use std::path::{Path, PathBuf};

use clap::Subcommand;
use log::info;
use tabula_common::config::AppConfig;
use tabula_table::error::{TableError, TableResult};
use tabula_table::provider::TableOperations;
use tabula_table_http::HttpTableClient;
use tabula_telemetry::telemetry::{init_telemetry, shutdown_telemetry, LogOptions};

#[derive(Debug, Subcommand)]
pub enum TableCommand {
    /// Create a table from a SELECT statement
    Create {
        integration: String,
        name: String,
        select: String,
    },
    /// Create a table from a SELECT statement, replacing the existing table if any
    CreateOrReplace {
        integration: String,
        name: String,
        select: String,
    },
    /// Delete a table
    Delete { integration: String, name: String },
    /// Remove a table (same as delete)
    Remove { integration: String, name: String },
    /// Update a table with an UPDATE statement
    Update {
        integration: String,
        name: String,
        update_query: String,
    },
    /// Insert the rows of a SELECT statement into a table
    Insert {
        integration: String,
        name: String,
        select: String,
    },
    /// Delete an uploaded file
    DeleteFile { name: String },
    /// Upload a file to the files integration
    UploadFile {
        path: PathBuf,
        /// The name of the uploaded file, defaults to the file name without extension
        #[arg(long)]
        name: Option<String>,
    },
    /// List the tables in an integration
    List { integration: String },
}

pub fn run_table_command(
    command: TableCommand,
    log_filter: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        init_telemetry(LogOptions {
            default_filter: log_filter,
        })
    })?;

    let client = HttpTableClient::try_from_config(&config)?;
    info!("using server at {}", client.executor().base_url());
    let result = runtime.block_on(execute(&client, command));
    shutdown_telemetry();

    for line in result? {
        println!("{line}");
    }
    Ok(())
}

/// Runs the command and returns the lines to print.
async fn execute(client: &HttpTableClient, command: TableCommand) -> TableResult<Vec<String>> {
    let output = match command {
        TableCommand::Create {
            integration,
            name,
            select,
        } => {
            let table = client.create_table(&name, &integration, &select).await?;
            vec![format!("created table {table}")]
        }
        TableCommand::CreateOrReplace {
            integration,
            name,
            select,
        } => {
            let table = client
                .create_or_replace_table(&name, &integration, &select)
                .await?;
            vec![format!("created table {table}")]
        }
        TableCommand::Delete { integration, name } => {
            client.delete_table(&name, &integration).await?;
            vec![format!("deleted table {integration}.{name}")]
        }
        TableCommand::Remove { integration, name } => {
            client.remove_table(&name, &integration).await?;
            vec![format!("removed table {integration}.{name}")]
        }
        TableCommand::Update {
            integration,
            name,
            update_query,
        } => {
            client
                .update_table(&name, &integration, &update_query)
                .await?;
            vec![format!("updated table {integration}.{name}")]
        }
        TableCommand::Insert {
            integration,
            name,
            select,
        } => {
            client.insert_table(&name, &integration, &select).await?;
            vec![format!("inserted into table {integration}.{name}")]
        }
        TableCommand::DeleteFile { name } => {
            client.delete_file(&name).await?;
            vec![format!("deleted file {name}")]
        }
        TableCommand::UploadFile { path, name } => {
            let (name, original_file_name) = upload_names(&path, name)?;
            let content = tokio::fs::read(&path).await.map_err(|e| {
                TableError::InvalidArgument(format!("cannot read {}: {e}", path.display()))
            })?;
            let table = client
                .upload_file(&name, &original_file_name, content)
                .await?;
            vec![format!("uploaded file {table}")]
        }
        TableCommand::List { integration } => client
            .list_tables(&integration)
            .await?
            .into_iter()
            .map(|table| table.to_string())
            .collect(),
    };
    Ok(output)
}

/// Returns the name of the uploaded file and its original file name.
fn upload_names(path: &Path, name: Option<String>) -> TableResult<(String, String)> {
    let original_file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| TableError::InvalidArgument(format!("invalid file path: {}", path.display())))?
        .to_string();
    let name = match name {
        Some(name) => name,
        None => path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&original_file_name)
            .to_string(),
    };
    Ok((name, original_file_name))
}
