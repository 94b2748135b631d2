use std::{io::IsTerminal, path::PathBuf};

use anyhow::{anyhow, Context};
use clap::Parser;
use eframe::{egui, NativeOptions};
use project_timeline::{
    source::{demo_projects, load_projects, project_file_schema},
    TimelineApp, ViewerConfig,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "project-timeline", about = "Interactive project timeline viewer")]
struct Args {
    /// Project list to display (.json or .csv).
    #[arg(long)]
    projects: Option<PathBuf>,

    /// Config file; defaults to the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start in fullscreen.
    #[arg(long)]
    fullscreen: bool,

    /// Print the project file JSON schema and exit.
    #[arg(long)]
    print_schema: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    if args.print_schema {
        let schema = serde_json::to_string_pretty(&project_file_schema())
            .context("serializing project schema")?;
        println!("{schema}");
        return Ok(());
    }

    let mut config = ViewerConfig::load_or_default(args.config.as_deref());
    config.start_fullscreen |= args.fullscreen;

    let (projects, load_error) = match args.projects.or_else(|| config.projects_path.clone()) {
        Some(path) => match load_projects(&path) {
            Ok(projects) => (projects, None),
            Err(err) => {
                warn!(error = %err, "startup project load failed");
                (Vec::new(), Some(format!("Load failed: {err}")))
            }
        },
        None => {
            info!("no project file configured, showing demo portfolio");
            (demo_projects(), None)
        }
    };

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.title.as_str())
            .with_fullscreen(config.start_fullscreen)
            .with_resizable(true)
            .with_inner_size([1440.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    let config_path = args.config.or_else(ViewerConfig::default_path);
    let title = config.title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            let mut app = TimelineApp::new(cc, config, projects).with_config_path(config_path);
            if let Some(message) = load_error {
                app.set_status(message);
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("viewer exited with error: {e}"))
}
