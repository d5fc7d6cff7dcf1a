use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lako_core::boot::{ConfigLoader, EnvLoader, DEFAULT_ENV_FILE};
use lako_core::kernel::constants::{APP_NAME, CONFIG_KEY_DEBUG, DEFAULT_CONFIG_FILE};
use lako_core::{Application, RouteTable};
use log::{error, info};

/// Lako: boot an application from env files, config files and flags, then serve it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Config file to load; repeat to layer files (default: config/app.toml)
    #[arg(long = "config", value_name = "FILE")]
    config: Vec<PathBuf>,

    /// Directory holding the env files
    #[arg(long, value_name = "DIR", default_value = ".")]
    env_dir: PathBuf,

    /// Env file name inside --env-dir; repeat for several (default: .env)
    #[arg(long = "env-file", value_name = "NAME")]
    env_file: Vec<String>,

    /// Listen address, overriding the `listen` config key
    #[arg(long, value_name = "ADDR")]
    listen: Option<String>,

    /// Enable debug mode; overrides the `debug` config key
    #[arg(long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    debug: Option<bool>,

    /// Application name, overriding the `name` config key
    #[arg(long)]
    name: Option<String>,

    /// Boot, print the resolved config as JSON and exit
    #[arg(long)]
    check: bool,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_level);
    if let Err(e) = env_logger::Builder::from_env(env).try_init() {
        eprintln!("Failed to initialize logger: {}", e);
    }
}

fn build_app(args: &CliArgs) -> Application {
    let config_files = if args.config.is_empty() {
        vec![PathBuf::from(DEFAULT_CONFIG_FILE)]
    } else {
        args.config.clone()
    };
    let env_files = if args.env_file.is_empty() {
        vec![DEFAULT_ENV_FILE.to_string()]
    } else {
        args.env_file.clone()
    };

    let mut app = Application::new()
        .with_loader(EnvLoader::with_files(args.env_dir.clone(), env_files))
        .with_loader(ConfigLoader::new(config_files));
    if let Some(name) = &args.name {
        app = app.with_name(name.clone());
    }
    // The config loader's flag layer sees only what clap already parsed
    if let Some(debug) = args.debug {
        app = app.with_args([format!("--{}={}", CONFIG_KEY_DEBUG, debug)]);
    }
    app
}

fn routes(name: &str, debug: bool) -> RouteTable {
    let greeting = format!("Hello from {}\n", name);
    RouteTable::new()
        .get("/", move |_req, res| res.body_mut().extend_from_slice(greeting.as_bytes()))
        .get("/health", move |_req, res| {
            let body = if debug { "ok (debug)\n" } else { "ok\n" };
            res.body_mut().extend_from_slice(body.as_bytes());
        })
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.debug.unwrap_or(false));

    let mut app = build_app(&args);
    if let Err(e) = app.boot().await {
        error!("Failed to boot application: {}", e);
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    if args.check {
        match serde_json::to_string_pretty(&app.config().to_json()) {
            Ok(json) => {
                println!("{}", json);
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                eprintln!("Error: failed to render config: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    let name = if app.name().is_empty() {
        APP_NAME.to_string()
    } else {
        app.name().to_string()
    };
    let debug = app.config().bool_or(CONFIG_KEY_DEBUG, false);
    app.set_router(routes(&name, debug));
    info!("Starting {} (debug: {})", name, debug);

    match app.run(args.listen.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Application stopped with an error: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
