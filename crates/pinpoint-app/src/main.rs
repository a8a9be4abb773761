mod cli;
mod commands;
mod renderer;
mod run;

use pinpoint_common::Point;
use pinpoint_config::PinpointConfig;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use cli::Command;

const DEFAULT_DIRECTIVE: &str = "pinpoint=info";

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("panic: {info}");
        eprintln!("\n--- PinPoint crashed ---");
        eprintln!("Pending edits since the last flush may be lost.");
        eprintln!("------------------------\n");
        default_hook(info);
    }));
}

fn init_logging(directive: &str) {
    let directive: Result<Directive, _> = directive
        .parse()
        .or_else(|_| DEFAULT_DIRECTIVE.parse());
    let filter = match directive {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    install_panic_hook();

    let args = cli::parse();

    // Load config before logging so its level can apply; report afterwards.
    let loaded = match &args.config {
        Some(path) => pinpoint_config::load_config_from(path),
        None => pinpoint_config::load_config(),
    };

    let directive = match (&args.log_level, &loaded) {
        (Some(level), _) => level.clone(),
        (None, Ok(config)) => format!("pinpoint={}", config.logging.level.as_str()),
        (None, Err(_)) => DEFAULT_DIRECTIVE.to_string(),
    };
    init_logging(&directive);

    tracing::info!("PinPoint v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) if args.config.is_some() => {
            tracing::error!("Config load failed: {e}");
            std::process::exit(2);
        }
        Err(e) => {
            tracing::warn!("Config load failed, using defaults: {e}");
            PinpointConfig::default()
        }
    };
    if let Some(dir) = args.data_dir {
        tracing::info!("Using data directory override: {}", dir.display());
        config.storage.data_dir = Some(dir);
    }

    let result = match args.command {
        Command::Tiles => commands::list_tiles(&config),
        Command::Layouts => commands::list_layouts(&config),
        Command::Displays => commands::list_displays(&config),
        Command::NewTile {
            tile_type,
            content,
            id,
        } => commands::new_tile(&config, &tile_type, content, id),
        Command::NewLayout { name, display } => {
            commands::new_layout(&config, name.as_deref(), display)
        }
        Command::Place { layout, tile, x, y } => {
            commands::place(&config, &layout, &tile, Point::new(x, y))
        }
        Command::DeleteTile { id } => commands::delete_tile(&config, &id),
        Command::DeleteLayout { id } => commands::delete_layout(&config, &id),
        Command::Project { layout, display } => run::project(&config, &layout, display),
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
