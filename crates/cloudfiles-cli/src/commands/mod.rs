//! Subcommands.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Subcommand};
use cloudfiles_client::{Connection, ListParams, Metadata, ObjectListParams};

use crate::TRACING_TARGET_COMMANDS;

/// Operation to run against the account.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show the container count and bytes used by the account
    Info,
    /// List containers, or the objects of a container
    List(ListArgs),
    /// Upload a file as an object
    Upload(UploadArgs),
    /// Download an object into a file
    Download(DownloadArgs),
    /// Delete an object, or an empty container
    Delete(DeleteArgs),
    /// Publish a container on the CDN and print its public URI
    Publish(PublishArgs),
    /// Stop publishing a container on the CDN
    Unpublish(ContainerArg),
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Container whose objects are listed
    pub container: Option<String>,

    /// Only list objects whose names start with this prefix
    #[arg(long, requires = "container")]
    pub prefix: Option<String>,

    /// Maximum number of entries
    #[arg(long)]
    pub limit: Option<u32>,

    /// Start listing after this name
    #[arg(long)]
    pub marker: Option<String>,

    /// Show sizes and content types
    #[arg(long, short = 'l')]
    pub long: bool,

    /// List the containers published on the CDN
    #[arg(long, conflicts_with = "container")]
    pub public: bool,
}

#[derive(Debug, Clone, Args)]
pub struct UploadArgs {
    /// Target container
    pub container: String,

    /// File to upload
    pub file: PathBuf,

    /// Object name, defaults to the file name
    #[arg(long)]
    pub name: Option<String>,

    /// Content type, guessed from the object name when omitted
    #[arg(long)]
    pub content_type: Option<String>,

    /// Metadata entry as KEY=VALUE, may be repeated
    #[arg(long = "meta", value_parser = parse_key_value)]
    pub metadata: Vec<(String, String)>,

    /// Skip sending the MD5 checksum
    #[arg(long)]
    pub no_verify: bool,

    /// Create the parent directory markers of the object name
    #[arg(long)]
    pub create_paths: bool,
}

#[derive(Debug, Clone, Args)]
pub struct DownloadArgs {
    /// Source container
    pub container: String,

    /// Object name
    pub object: String,

    /// Target file, defaults to the last element of the object name
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct DeleteArgs {
    /// Container to delete, or that holds the object
    pub container: String,

    /// Object to delete
    pub object: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct PublishArgs {
    /// Container to publish
    pub container: String,

    /// CDN cache TTL in seconds
    #[arg(long)]
    pub ttl: Option<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct ContainerArg {
    /// Container name
    pub container: String,
}

impl Command {
    /// Runs the command and prints its result to stdout.
    pub async fn execute(self, connection: &Connection) -> anyhow::Result<()> {
        tracing::debug!(target: TRACING_TARGET_COMMANDS, command = ?self, "Running command");

        match self {
            Command::Info => {
                let info = connection.info().await.context("failed to read account info")?;
                println!("containers: {}", info.container_count);
                println!("bytes used: {}", info.bytes_used);
            }
            Command::List(args) => list(connection, args).await?,
            Command::Upload(args) => upload(connection, args).await?,
            Command::Download(args) => download(connection, args).await?,
            Command::Delete(args) => match args.object {
                Some(object) => {
                    let container = connection.get_container(&args.container).await?;
                    container
                        .delete_object(&object)
                        .await
                        .with_context(|| format!("failed to delete '{object}'"))?;
                }
                None => connection
                    .delete_container(&args.container)
                    .await
                    .with_context(|| format!("failed to delete container '{}'", args.container))?,
            },
            Command::Publish(args) => {
                let mut container = connection.get_container(&args.container).await?;
                let uri = container
                    .make_public(args.ttl)
                    .await
                    .context("failed to publish container")?;
                println!("{uri}");
            }
            Command::Unpublish(args) => {
                let mut container = connection.get_container(&args.container).await?;
                container
                    .make_private()
                    .await
                    .context("failed to unpublish container")?;
            }
        }

        Ok(())
    }
}

async fn list(connection: &Connection, args: ListArgs) -> anyhow::Result<()> {
    if args.public {
        for name in connection.list_public_containers().await? {
            println!("{name}");
        }
        return Ok(());
    }

    let Some(container) = args.container else {
        let mut params = ListParams::new();
        params.limit = args.limit;
        params.marker = args.marker;

        if args.long {
            for info in connection.list_containers_info(&params).await? {
                println!("{:>12} {:>8} {}", info.bytes, info.count, info.name);
            }
        } else {
            for name in connection.list_containers(&params).await? {
                println!("{name}");
            }
        }
        return Ok(());
    };

    let container = connection.get_container(&container).await?;
    let mut params = ObjectListParams::new();
    params.page.limit = args.limit;
    params.page.marker = args.marker;
    params.prefix = args.prefix;

    if args.long {
        for info in container.list_objects_info(&params).await? {
            println!(
                "{:>12} {:<24} {}",
                info.bytes,
                info.content_type.as_deref().unwrap_or("-"),
                info.name
            );
        }
    } else {
        for name in container.list_objects(&params).await? {
            println!("{name}");
        }
    }
    Ok(())
}

async fn upload(connection: &Connection, args: UploadArgs) -> anyhow::Result<()> {
    let name = match args.name {
        Some(name) => name,
        None => match args.file.file_name().and_then(|name| name.to_str()) {
            Some(name) => name.to_owned(),
            None => bail!("cannot derive an object name from '{}'", args.file.display()),
        },
    };

    let container = connection.get_container(&args.container).await?;
    if args.create_paths {
        container.create_paths(&name).await?;
    }

    let mut object = container.create_object(&name)?;
    if let Some(content_type) = args.content_type {
        object.set_content_type(content_type);
    }
    *object.metadata_mut() = args.metadata.into_iter().collect::<Metadata>();

    object
        .load_from_path(&args.file, !args.no_verify)
        .await
        .with_context(|| format!("failed to upload '{}'", args.file.display()))?;

    println!("{} {}", object.etag().unwrap_or("-"), object.name());
    Ok(())
}

async fn download(connection: &Connection, args: DownloadArgs) -> anyhow::Result<()> {
    let output = match args.output {
        Some(output) => output,
        None => PathBuf::from(args.object.rsplit('/').next().unwrap_or(&args.object)),
    };

    let container = connection.get_container(&args.container).await?;
    let object = container.get_object(&args.object).await?;
    let written = object
        .save_to_path(&output)
        .await
        .with_context(|| format!("failed to download '{}'", args.object))?;

    println!("{written} bytes written to {}", output.display());
    Ok(())
}

fn parse_key_value(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected KEY=VALUE, got '{value}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata_entries() {
        assert_eq!(
            parse_key_value("author=EJ").unwrap(),
            ("author".to_owned(), "EJ".to_owned())
        );
        assert_eq!(
            parse_key_value("note=a=b").unwrap(),
            ("note".to_owned(), "a=b".to_owned())
        );
        assert!(parse_key_value("missing").is_err());
        assert!(parse_key_value("=value").is_err());
    }
}
