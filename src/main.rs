use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uplyfile_storage::api::{UplyApi, UplyClient};
use uplyfile_storage::image::UplyImage;
use uplyfile_storage::models::Config;
use uplyfile_storage::storage::{BlobStorage, UplyStorage};

#[derive(Debug, Parser)]
#[command(name = "uply")]
#[command(about = "Interact with the Uplyfile CDN")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every file hosted in the project
    List,
    /// Upload a local file, deduplicating against hosted content
    Upload {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Check whether a stored name still answers on the CDN
    Exists {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Print the hosted URL recorded for a stored name
    Url {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Build a transformation URL from a hosted file URL and an
    /// operation chain like "avatar:64,blur,resize:w200"
    Transform {
        #[arg(value_name = "URL")]
        url: String,
        #[arg(long, value_name = "OPS")]
        ops: String,
    },
}

fn optional_int(parts: &[&str], index: usize, op: &str) -> Result<Option<i64>> {
    match parts.get(index) {
        Some(raw) => {
            let value = raw
                .parse::<i64>()
                .with_context(|| format!("{}: {:?} is not an integer", op, raw))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

fn required_int(parts: &[&str], index: usize, op: &str) -> Result<i64> {
    optional_int(parts, index, op)?
        .with_context(|| format!("{} requires an argument at position {}", op, index))
}

/// Apply one colon-delimited operation spec to the builder.
fn apply_operation(image: UplyImage, spec: &str) -> Result<UplyImage> {
    let parts: Vec<&str> = spec.split(':').collect();
    let op = parts[0];

    let image = match op {
        "avatar" => image.avatar(optional_int(&parts, 1, op)?),
        "face_mark" => image.face_mark(),
        "face_crop" => {
            let align = parts.last() == Some(&"align");
            let index = if parts.len() > 1 && parts[1] != "align" {
                optional_int(&parts, 1, op)?
            } else {
                None
            };
            image.face_crop(index, align)
        }
        "autoformat" => image.autoformat(),
        "download" => image.download(),
        "progressive" => image.progressive(),
        "quality" => match parts.get(1) {
            Some(value) => image.quality(value),
            None => bail!("quality requires a value"),
        },
        "blur" => image.blur(optional_int(&parts, 1, op)?),
        "median" => image.median(optional_int(&parts, 1, op)?),
        "bilateral" => image.bilateral(optional_int(&parts, 1, op)?),
        "sharpen" => image.sharpen(optional_int(&parts, 1, op)?),
        "autocontrast" => image.autocontrast(optional_int(&parts, 1, op)?),
        "bw" | "black_and_white" => image.black_and_white(),
        "invert" => image.invert(),
        "duotone" => match (parts.get(1), parts.get(2)) {
            (Some(first), Some(second)) => image.duotone(first, second),
            _ => bail!("duotone requires two values"),
        },
        "pixelate" => image.pixelate(
            optional_int(&parts, 1, op)?,
            optional_int(&parts, 2, op)?,
            parts.get(3).copied(),
        ),
        "enhance" => image.enhance(),
        "mono" => image.mono(),
        "golden" => image.golden(),
        "resize" => match parts.len() {
            2 => image.resize_edge(parts[1]),
            3 => image.resize(required_int(&parts, 1, op)?, required_int(&parts, 2, op)?),
            _ => bail!("resize takes one spec or width:height"),
        },
        "crop" => match parts.len() {
            3 => image.crop(required_int(&parts, 1, op)?, required_int(&parts, 2, op)?),
            4 => image.crop_anchored(
                required_int(&parts, 1, op)?,
                required_int(&parts, 2, op)?,
                parts[3],
            ),
            5 => image.crop_region(
                required_int(&parts, 1, op)?,
                required_int(&parts, 2, op)?,
                required_int(&parts, 3, op)?,
                required_int(&parts, 4, op)?,
            ),
            _ => bail!("crop takes two, three or four values"),
        },
        "fit" => image.fit(required_int(&parts, 1, op)?, required_int(&parts, 2, op)?),
        "fit_crop" => image.fit_crop(required_int(&parts, 1, op)?, required_int(&parts, 2, op)?),
        "rotate" => image.rotate(optional_int(&parts, 1, op)?),
        "mirror" => image.mirror(),
        "flip" => image.flip(),
        "autorotate" => image.autorotate(),
        "bg_color" => image.bg_color(parts.get(1).copied()),
        "format" => image.format(parts.get(1).copied()),
        _ => bail!("Unknown operation: {}", op),
    };

    Ok(image)
}

fn build_transform_url(url: &str, ops: &str) -> Result<String> {
    let mut image = UplyImage::parse(url)?;
    for spec in ops.split(',').filter(|spec| !spec.is_empty()) {
        image = apply_operation(image, spec)?;
    }
    Ok(image.url())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::List => {
            let config = Config::from_env()?;
            let client = UplyClient::from_config(&config)?;
            for file in client.list_project_files().await? {
                println!("{}  {}", file.etag, file.url.full);
            }
        }
        Command::Upload { path } => {
            let config = Config::from_env()?;
            let storage = UplyStorage::from_config(&config)?;
            let name = storage.save_path(&path).await?;
            storage.persist()?;
            println!("{}", storage.url(&name)?);
        }
        Command::Exists { name } => {
            let config = Config::from_env()?;
            let storage = UplyStorage::from_config(&config)?;
            println!("{}", storage.exists(&name).await?);
        }
        Command::Url { name } => {
            let config = Config::from_env()?;
            let storage = UplyStorage::from_config(&config)?;
            println!("{}", storage.url(&name)?);
        }
        Command::Transform { url, ops } => {
            println!("{}", build_transform_url(&url, &ops)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uplyfile_storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::build_transform_url;

    const PIC: &str = "https://uplycdn.com/P1/F1/pic.jpg";

    #[test]
    fn test_build_transform_url_applies_chain() {
        let url = build_transform_url(PIC, "avatar:64,blur,bw").unwrap();
        assert_eq!(url, "https://uplycdn.com/P1/F1/avatar:64,blur,bw/pic.jpg");
    }

    #[test]
    fn test_build_transform_url_resize_forms() {
        assert_eq!(
            build_transform_url(PIC, "resize:w200").unwrap(),
            "https://uplycdn.com/P1/F1/resize:w200/pic.jpg"
        );
        assert_eq!(
            build_transform_url(PIC, "resize:200:100").unwrap(),
            "https://uplycdn.com/P1/F1/resize:200:100/pic.jpg"
        );
    }

    #[test]
    fn test_build_transform_url_format_changes_extension() {
        assert_eq!(
            build_transform_url(PIC, "blur,format:png").unwrap(),
            "https://uplycdn.com/P1/F1/blur/pic.png"
        );
    }

    #[test]
    fn test_build_transform_url_rejects_unknown_op() {
        let err = build_transform_url(PIC, "sparkle").unwrap_err();
        assert!(err.to_string().contains("Unknown operation"));
    }

    #[test]
    fn test_build_transform_url_requires_duotone_values() {
        let err = build_transform_url(PIC, "duotone:red").unwrap_err();
        assert!(err.to_string().contains("two values"));
    }
}
