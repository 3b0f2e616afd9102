// OnlyPlayer - local folder media player
// Point it at a folder, it queues every audio/video file it finds and plays them in place

use anyhow::Result;
use clap::{Parser, Subcommand};
use onlyplayer::media::{FolderScanner, LocalDirectory, ObjectUrls, PromptPicker};
use onlyplayer::player::{MediaOutput, NullOutput, Session};
use onlyplayer::storage::{FolderRegistry, PreferenceStore};
use onlyplayer::ui::{text, Locale, Notice};
use onlyplayer::{Action, Config};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "onlyplayer")]
#[command(about = "Play the audio and video files of a local folder")]
struct Args {
    /// Enable developer logging (stderr + debug output)
    #[arg(long)]
    dev: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a folder and print what would be queued
    Scan { dir: PathBuf },
    /// List saved folders, most recently opened first
    Folders,
    /// Remove a saved folder
    Forget { id: String },
    /// Play a folder (asks for one when no folder is given)
    Play {
        dir: Option<PathBuf>,
        /// Reopen a saved folder by id
        #[arg(long, conflicts_with = "dir")]
        saved: Option<String>,
    },
}

fn init_logging(log_dir: &Path, dev: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(log_dir, "onlyplayer.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Base filter: info level for general logs, debug for onlyplayer
    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,onlyplayer=debug"));

    let builder = tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(base_filter);

    if dev {
        let subscriber = builder.with_writer(file_writer.and(std::io::stderr)).finish();
        tracing::subscriber::set_global_default(subscriber)?;
        eprintln!("Dev mode: debug output on stderr + {}", log_dir.display());
    } else {
        tracing::subscriber::set_global_default(builder.with_writer(file_writer).finish())?;
    }

    Ok(guard)
}

// Audio backends print straight to stderr, which would tear up the status line
#[cfg(all(unix, feature = "audio"))]
fn redirect_stderr_to_null() -> Result<()> {
    unsafe {
        let null_fd = libc::open(b"/dev/null\0".as_ptr() as *const libc::c_char, libc::O_WRONLY);
        if null_fd == -1 {
            return Err(anyhow::anyhow!("Failed to open /dev/null"));
        }

        if libc::dup2(null_fd, libc::STDERR_FILENO) == -1 {
            libc::close(null_fd);
            return Err(anyhow::anyhow!("Failed to redirect stderr"));
        }

        libc::close(null_fd);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    let _log_guard = init_logging(&config.log_dir, args.dev)?;
    info!("OnlyPlayer starting up");

    match args.command.unwrap_or(Commands::Play { dir: None, saved: None }) {
        Commands::Scan { dir } => scan(&config, dir).await,
        Commands::Folders => list_folders(&config).await,
        Commands::Forget { id } => forget(&config, &id).await,
        Commands::Play { dir, saved } => play(&config, dir, saved, args.dev).await,
    }
}

async fn scan(config: &Config, dir: PathBuf) -> Result<()> {
    let urls = Rc::new(ObjectUrls::new());
    let scanner = FolderScanner::new(urls.clone()).with_limit(config.library.max_items);

    let items = scanner.scan(&LocalDirectory::open(dir)).await?;
    if items.is_empty() {
        println!("{}", text(config.ui.locale, Notice::EmptyFolder));
    }
    for item in &items {
        println!(
            "{:5}  {:>10}  {}",
            item.kind.as_str(),
            onlyplayer::ui::format_size(item.size, "MB"),
            item.handle.path().display()
        );
        urls.revoke(&item.url);
    }

    Ok(())
}

async fn list_folders(config: &Config) -> Result<()> {
    let registry = FolderRegistry::open(&config.database_path)?;
    let folders = registry.list_all().await?;

    if folders.is_empty() {
        println!("{}", text(config.ui.locale, Notice::PickFolder));
    }
    for folder in folders {
        let opened = folder
            .last_accessed_at()
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{}  {}  {}", folder.id, opened, folder.location.display());
    }

    Ok(())
}

async fn forget(config: &Config, id: &str) -> Result<()> {
    let registry = FolderRegistry::open(&config.database_path)?;
    if registry.remove(id).await? {
        println!("Forgot '{}'", id);
    } else {
        println!("No saved folder '{}'", id);
    }
    Ok(())
}

fn open_output(urls: &Rc<ObjectUrls>) -> Box<dyn MediaOutput> {
    #[cfg(feature = "audio")]
    {
        match onlyplayer::player::RodioOutput::new(urls.clone()) {
            Ok(output) => return Box::new(output),
            Err(e) => warn!("No audio device, continuing without sound: {:#}", e),
        }
    }
    #[cfg(not(feature = "audio"))]
    let _ = urls;

    Box::new(NullOutput::default())
}

async fn play(
    config: &Config,
    dir: Option<PathBuf>,
    saved: Option<String>,
    dev: bool,
) -> Result<()> {
    let locale = config.ui.locale;
    let urls = Rc::new(ObjectUrls::new());
    let output = open_output(&urls);

    let registry = match FolderRegistry::open(&config.database_path) {
        Ok(registry) => Some(registry),
        Err(e) => {
            warn!("Saved folders unavailable: {:#}", e);
            None
        }
    };
    let prefs = PreferenceStore::detect(Config::profile_dir(), Config::fallback_dir());

    let mut session = Session::new(output, urls, prefs, registry)
        .with_scan_limit(config.library.max_items);
    session.restore_preferences().await;
    session.refresh_folders().await;

    let loaded = match (dir, saved) {
        (Some(dir), _) => session.load_from_directory(&LocalDirectory::open(dir)).await.map(Some),
        (None, Some(id)) => session.load_from_saved_folder(&id).await.map(Some),
        (None, None) => session.pick_and_load(&mut PromptPicker).await,
    };

    match loaded {
        Ok(Some(0)) => println!("{}", text(locale, Notice::EmptyFolder)),
        Ok(Some(count)) => {
            debug!("Starting playback over {} items", count);

            #[cfg(all(unix, feature = "audio"))]
            {
                if !dev {
                    if let Err(e) = redirect_stderr_to_null() {
                        warn!("Could not silence stderr: {:#}", e);
                    }
                }
            }
            #[cfg(not(all(unix, feature = "audio")))]
            let _ = dev;

            run(&mut session, config, locale).await?;
        }
        Ok(None) => println!("{}", text(locale, Notice::PickFolder)),
        Err(e) => println!("{}: {}", text(locale, Notice::for_error(&e)), e),
    }

    session.shutdown().await;
    info!("OnlyPlayer shut down");
    Ok(())
}

#[cfg(feature = "tui")]
async fn run<O: MediaOutput>(
    session: &mut Session<O>,
    config: &Config,
    locale: Locale,
) -> Result<()> {
    use onlyplayer::ui::{
        action_notice, draw_status, poll_command, status_line, Command, TerminalGuard,
    };

    let tick = Duration::from_millis(config.ui.tick_ms);
    let guard = TerminalGuard::new()?;
    let mut notice: Option<String> = None;

    loop {
        session.pump().await;

        let line = status_line(session.state(), locale);
        match &notice {
            Some(notice) => draw_status(&format!("{}  [{}]", line, notice))?,
            None => draw_status(&line)?,
        }

        let Some(command) = poll_command(tick, config.ui.volume_step)? else {
            continue;
        };
        notice = None;

        match command {
            Command::Quit => break,
            Command::Action(action) => {
                let before = session.state().clone();
                session.dispatch(action.clone()).await;
                notice = action_notice(&action, &before, session.state())
                    .map(|n| text(locale, n).to_string());
            }
            Command::VolumeStep(delta) => {
                let volume = session.state().volume + delta;
                session.dispatch(Action::SetVolume(volume)).await;
            }
            Command::SeekBy(delta) => {
                let target = session.state().current_time + delta;
                session.seek(target);
            }
            Command::PictureInPicture => {
                if let Err(e) = session.picture_in_picture() {
                    notice = Some(e.to_string());
                }
            }
            Command::Snapshot => {
                notice = Some(match session.snapshot(&config.snapshot_dir) {
                    Ok(path) => format!("saved {}", path.display()),
                    Err(e) => e.to_string(),
                });
            }
        }
    }

    drop(guard);
    println!();
    Ok(())
}

/// Without a terminal front, play the queue through once.
#[cfg(not(feature = "tui"))]
async fn run<O: MediaOutput>(
    session: &mut Session<O>,
    config: &Config,
    locale: Locale,
) -> Result<()> {
    let tick = Duration::from_millis(config.ui.tick_ms);

    session.dispatch(Action::SetPlaying(true)).await;
    while session.state().playing {
        session.pump().await;
        tokio::time::sleep(tick).await;
    }
    println!("{}", onlyplayer::ui::status_line(session.state(), locale));

    Ok(())
}
