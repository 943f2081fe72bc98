use crate::config::{
    default_cache_root, default_config_root, default_output_dir, load_settings,
    resolve_credentials,
};
use crate::error::{Error, Result};
use clap::Parser;
use liblecture::{
    run, DownloadStrategy, LectureConfig, Update, DEFAULT_EXTRACTOR, DEFAULT_PROGRESS_INTERVAL,
};
use owo_colors::{OwoColorize, Stream};
use std::path::PathBuf;
use tokio::sync::mpsc::channel;

const MAX_BUFFER_SIZE: usize = 100;

#[derive(Parser, Debug)]
#[command(
    name = "lecture-manager",
    version,
    disable_version_flag = true,
    about = "download lectures from Panopto",
    long_about = "Downloads every recording of the folders listed in settings.json, \
    skipping the ones downloaded by earlier runs."
)]
pub struct Cli {
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version, help = "print version")]
    version: Option<bool>,
    #[arg(
        short,
        long,
        help = "pass the .ASPXAUTH token, if a token cannot be found. \
        It's a cookie, obtained from the browser after logging into panopto"
    )]
    token: Option<String>,
    #[arg(
        short = 'b',
        long = "panopto-base",
        help = "pass the panopto base URL if one cannot be found, \
        e.g https://york.cloud.panopto.eu"
    )]
    base: Option<String>,
    #[arg(
        short,
        long,
        help = "custom config directory where settings are stored (XDG_CONFIG_HOME by default)"
    )]
    settings: Option<PathBuf>,
    #[arg(short, long, help = "custom downloads directory (~/Downloads by default)")]
    output: Option<PathBuf>,
    #[arg(
        short = 'y',
        long = "yt-dl",
        help = "use a stream extractor to download the streams instead of the provided download link"
    )]
    ytdl: bool,
    #[arg(long, default_value = DEFAULT_EXTRACTOR, help = "stream extractor program used with --yt-dl")]
    extractor: String,
    #[arg(
        short,
        long,
        conflicts_with = "no_cache",
        help = "custom cache directory (XDG_CACHE_HOME by default)"
    )]
    cache: Option<PathBuf>,
    #[arg(short, long, help = "don't cache the token and the base URL")]
    no_cache: bool,
}

impl Cli {
    /// Turns flags, saved credentials and settings into the configuration of a run.
    pub fn resolve(self) -> Result<LectureConfig> {
        let cache_root = self.cache.or_else(default_cache_root);
        let resolved =
            resolve_credentials(self.token, self.base, cache_root.as_deref(), self.no_cache)?;
        let settings = load_settings(self.settings.or_else(default_config_root).as_deref())?;

        let (token, base_url) = match (resolved.credentials.token, resolved.credentials.base) {
            (Some(token), Some(base)) => (token, base),
            _ => return Err(Error::MissingCredentials),
        };
        let output_dir = match self.output.or_else(default_output_dir) {
            Some(dir) => dir,
            None => return Err(Error::MissingOutputDirectory),
        };
        let cache_dir = match resolved.cache_dir {
            Some(dir) => dir,
            None => {
                println!("could not find cache directory, using current working directory");
                std::env::current_dir().map_err(|e| Error::file_op(&PathBuf::from("."), e))?
            }
        };

        let strategy = if self.ytdl {
            DownloadStrategy::StreamExtraction {
                program: self.extractor,
            }
        } else {
            DownloadStrategy::Direct
        };

        Ok(LectureConfig {
            token,
            base_url,
            output_dir,
            cache_dir,
            strategy,
            settings,
            progress_update_interval: DEFAULT_PROGRESS_INTERVAL,
        })
    }
}

/// Runs the download and prints its updates. Returns whether it completed.
pub async fn download(config: LectureConfig) -> bool {
    let (tx, mut rx) = channel::<Update>(MAX_BUFFER_SIZE);
    let output_dir = config.output_dir.clone();
    let task = tokio::spawn(async move { run(&config, tx).await });

    while let Some(update) = rx.recv().await {
        match update {
            Update::MessageUpdate(msg) => {
                if msg.is_error {
                    eprintln!(
                        "{} | {}",
                        msg.content
                            .if_supports_color(Stream::Stderr, |text| text.red()),
                        msg.resource_name
                    );
                } else {
                    println!(
                        "{} {}",
                        msg.content
                            .if_supports_color(Stream::Stdout, |text| text.cyan()),
                        msg.resource_name
                    );
                }
            }
            Update::ProgressUpdate(progress) => {
                if progress.file_size > 0 && progress.bytes_written >= progress.file_size {
                    println!(
                        "{} {} {} bytes",
                        "[Downloaded]".if_supports_color(Stream::Stdout, |text| text.green()),
                        progress.resource_name,
                        progress.file_size
                    )
                }
            }
        };
    }

    match task.await {
        Ok(Ok(summary)) => {
            println!(
                "{} new, {} already downloaded, in {} folder(s). {}",
                summary.downloaded,
                summary.skipped,
                summary.folders,
                output_dir.to_string_lossy()
            );
            true
        }
        Ok(Err(e)) => {
            eprintln!("Download wasn't able to complete");
            eprintln!("{}", e.if_supports_color(Stream::Stderr, |text| text.red()));
            false
        }
        Err(e) => {
            tracing::error!("Download task failed : {}", e);
            eprintln!("Download wasn't able to complete");
            false
        }
    }
}
