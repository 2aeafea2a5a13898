//! Halo CLI - run the shell against a host, or use its pieces standalone

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use halo_app::{logging, HaloConfig, Shell, ShellOptions, CONFIG_FILE};
use halo_core::JsonLineBridge;
use halo_i18n::{ArgValue, I18nState, LocaleCatalog, Message};
use halo_store::{dereference, validate, FieldKind, FieldRegistry, FileStorage};
use halo_theme::{generate, FileStyleSink, Palette, StyleSink};
use serde_json::{Map, Value};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "halo")]
#[command(author, version, about = "Halo desktop shell client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the shell, talking to the host over stdin/stdout
    Run,

    /// Print the light/dark stylesheet generated from a seed color
    Palette {
        /// Seed color (#rgb, #rrggbb, ...)
        hex: String,
        /// Print the variables as JSON instead of CSS
        #[arg(long)]
        json: bool,
        /// Write the stylesheet to a file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List the loaded locales
    Locales,

    /// Format a message
    Translate {
        /// Message id
        id: String,
        /// Language (defaults to the configured default locale)
        #[arg(short, long)]
        lang: Option<String>,
        /// Message argument, `name=value`
        #[arg(short, long = "arg", value_parser = parse_arg)]
        args: Vec<(String, String)>,
    },

    /// Show the widget each field of a settings schema is edited with
    Fields {
        /// JSON schema file of one settings group
        schema: PathBuf,
    },

    /// Validate a JSON value against a schema
    Check {
        /// JSON schema file
        schema: PathBuf,
        /// JSON value
        value: String,
    },
}

fn parse_arg(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let base = cli
        .config
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let config = HaloConfig::load(&cli.config)?.resolve_paths(&base);
    logging::init(&config.log.filter)?;

    match cli.command {
        Commands::Run => run(&config).await,
        Commands::Palette { hex, json, out } => palette(&hex, json, out),
        Commands::Locales => locales(&config),
        Commands::Translate { id, lang, args } => translate(&config, id, lang, args),
        Commands::Fields { schema } => fields(&schema),
        Commands::Check { schema, value } => check(&schema, &value),
    }
}

async fn run(config: &HaloConfig) -> Result<()> {
    let backend = Arc::new(JsonLineBridge::spawn(tokio::io::stdin(), tokio::io::stdout()));
    let storage = FileStorage::open(&config.storage.path).context("Failed to open local storage")?;
    let options = ShellOptions::new(
        load_catalog(config),
        Arc::new(storage),
        Arc::new(FileStyleSink::new(&config.theme.stylesheet)),
    )
    .default_locale(&config.i18n.default_locale)
    .system_dark(config.theme.system_dark);

    let shell = Shell::start(backend, options).await?;
    info!(stylesheet = %config.theme.stylesheet.display(), "Waiting for host events");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    shell.shutdown().await;
    Ok(())
}

fn palette(hex: &str, json: bool, out: Option<PathBuf>) -> Result<()> {
    let palettes = generate(hex)?;

    if json {
        let doc = serde_json::json!({
            "light": palette_json(&palettes.light),
            "dark": palette_json(&palettes.dark),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    let css = palettes.stylesheet();
    match out {
        Some(path) => {
            FileStyleSink::new(&path)
                .replace(&css)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{css}"),
    }
    Ok(())
}

fn palette_json(palette: &Palette) -> Value {
    let vars: Map<String, Value> = palette
        .iter()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();
    Value::Object(vars)
}

fn locales(config: &HaloConfig) -> Result<()> {
    let catalog = LocaleCatalog::load_dir(&config.i18n.locales_dir).with_context(|| {
        format!(
            "Failed to read locales from {}",
            config.i18n.locales_dir.display()
        )
    })?;

    for locale in catalog.locales() {
        let marker = if locale == config.i18n.default_locale {
            " (default)"
        } else {
            ""
        };
        println!("{locale}{marker}");
    }
    Ok(())
}

fn translate(
    config: &HaloConfig,
    id: String,
    lang: Option<String>,
    args: Vec<(String, String)>,
) -> Result<()> {
    let default = config.i18n.default_locale.clone();
    let selected = lang.unwrap_or_else(|| default.clone());
    let i18n = I18nState::new(load_catalog(config), default, selected);

    let msg = args
        .into_iter()
        .fold(Message::new(id), |msg, (name, value)| {
            msg.arg(name, ArgValue::parse(&value))
        });
    println!("{}", i18n.tr(&msg));
    Ok(())
}

fn fields(path: &Path) -> Result<()> {
    let schema = dereference(&read_json(path)?)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;

    let mut registry = FieldRegistry::new("input")
        .with(FieldKind::String, "input")
        .with(FieldKind::Number, "number")
        .with(FieldKind::Boolean, "switch")
        .with(FieldKind::Enum, "select");
    registry.register_custom("color", "color-picker");
    registry.register_custom("language", "language-selector");

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        warn!("{} has no properties", path.display());
        return Ok(());
    };
    for (name, property) in properties {
        println!("{name}: {}", registry.resolve(property));
    }
    Ok(())
}

fn check(path: &Path, value: &str) -> Result<()> {
    let schema = dereference(&read_json(path)?)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let value: Value = serde_json::from_str(value).context("Value is not valid JSON")?;

    match validate(&schema, &value, None) {
        Some(message) => anyhow::bail!("{message}"),
        None => {
            println!("ok");
            Ok(())
        }
    }
}

fn load_catalog(config: &HaloConfig) -> LocaleCatalog {
    match LocaleCatalog::load_dir(&config.i18n.locales_dir) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!("No translations loaded: {e}");
            LocaleCatalog::new()
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
