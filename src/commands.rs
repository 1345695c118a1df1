use std::sync::Arc;

use linestore::config::{Config, FileConfig, SettingKey, Settings};
use linestore::store::{BoundedLineStore, Line, RetentionLimit};
use tracing::info;

use crate::cli::{AppendArgs, Cli, Commands, ShowArgs};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn run(cli: Cli) -> Result<(), AnyError> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path.clone())?,
        None => Config::load()?,
    };
    let settings = Arc::new(config.settings());

    let ctx = Context { config, settings };
    match cli.command {
        Commands::Files => ctx.list_files(&cli.overrides),
        Commands::Show(args) => {
            let name = args.file.clone();
            ctx.with_store(&name, &cli.overrides, ShowOp(args))
        }
        Commands::Append(args) => {
            let name = args.file.clone();
            ctx.with_store(&name, &cli.overrides, AppendOp(args))
        }
        Commands::Clear(args) => ctx.with_store(&args.file, &cli.overrides, ClearOp),
        Commands::Prune(args) => ctx.with_store(&args.file, &cli.overrides, PruneOp),
        Commands::Config => {
            apply_overrides(&ctx.settings, &cli.overrides)?;
            print!("{}", toml::to_string_pretty(&ctx.config)?);
            Ok(())
        }
    }
}

struct Context {
    config: Config,
    settings: Arc<Settings>,
}

impl Context {
    fn list_files(&self, overrides: &[String]) -> Result<(), AnyError> {
        apply_overrides(&self.settings, overrides)?;

        for (name, file) in &self.config.files {
            let path = self.config.file_path(name).unwrap_or_default();
            let limit = match &file.limit {
                Some(key) => format!("{} = {}", key, self.settings.get(key)?),
                None => "unbounded".to_string(),
            };
            let mode = if file.binary { "binary" } else { "text" };
            println!("{name}\t{}\t{mode}\t{limit}", path.display());
        }
        Ok(())
    }

    fn with_store<O: StoreOp>(&self, name: &str, overrides: &[String], op: O) -> Result<(), AnyError> {
        let file = self
            .config
            .files
            .get(name)
            .ok_or_else(|| format!("Unknown file '{name}'"))?;

        if file.binary {
            self.run_op::<Vec<u8>, O>(name, file, overrides, op)
        } else {
            self.run_op::<String, O>(name, file, overrides, op)
        }
    }

    fn run_op<L: Line + Printable, O: StoreOp>(
        &self,
        name: &str,
        file: &FileConfig,
        overrides: &[String],
        op: O,
    ) -> Result<(), AnyError> {
        let path = self
            .config
            .file_path(name)
            .ok_or_else(|| format!("File '{name}' has no path"))?;

        let mut store =
            BoundedLineStore::<L>::open(path, Arc::clone(&self.settings), file.limit.clone())?;
        // Applied after open so a zero limit removes the file
        apply_overrides(&self.settings, overrides)?;
        op.run(&mut store)
    }
}

trait StoreOp {
    fn run<L: Line + Printable>(self, store: &mut BoundedLineStore<L>) -> Result<(), AnyError>;
}

struct ShowOp(ShowArgs);
struct AppendOp(AppendArgs);
struct ClearOp;
struct PruneOp;

impl StoreOp for ShowOp {
    fn run<L: Line + Printable>(self, store: &mut BoundedLineStore<L>) -> Result<(), AnyError> {
        let lines: Vec<String> = store.lines().iter().map(Printable::printable).collect();
        if self.0.json {
            println!("{}", serde_json::to_string_pretty(&lines)?);
        } else {
            for line in lines {
                println!("{line}");
            }
        }
        Ok(())
    }
}

impl StoreOp for AppendOp {
    fn run<L: Line + Printable>(self, store: &mut BoundedLineStore<L>) -> Result<(), AnyError> {
        let count = self.0.lines.len();
        store
            .lines_mut()
            .extend(self.0.lines.into_iter().map(L::from_string));
        store.save()?;
        info!(file = %store.path().display(), count, "Appended lines");
        Ok(())
    }
}

impl StoreOp for ClearOp {
    fn run<L: Line + Printable>(self, store: &mut BoundedLineStore<L>) -> Result<(), AnyError> {
        store.lines_mut().clear();
        store.save()?;
        Ok(())
    }
}

impl StoreOp for PruneOp {
    fn run<L: Line + Printable>(self, store: &mut BoundedLineStore<L>) -> Result<(), AnyError> {
        let total = store.lines().len();
        store.save()?;
        let kept = match store.limit()? {
            RetentionLimit::Unbounded => total,
            RetentionLimit::Lines(n) => n.min(total),
        };
        info!(file = %store.path().display(), total, kept, "Pruned file");
        Ok(())
    }
}

/// Conversions between CLI strings and stored lines
trait Printable {
    fn printable(&self) -> String;
    fn from_string(s: String) -> Self;
}

impl Printable for String {
    fn printable(&self) -> String {
        self.clone()
    }

    fn from_string(s: String) -> Self {
        s
    }
}

impl Printable for Vec<u8> {
    fn printable(&self) -> String {
        String::from_utf8_lossy(self).into_owned()
    }

    fn from_string(s: String) -> Self {
        s.into_bytes()
    }
}

/// Apply `section.option=value` overrides in order
fn apply_overrides(settings: &Settings, overrides: &[String]) -> Result<(), AnyError> {
    for raw in overrides {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| format!("Invalid override '{raw}', expected SECTION.OPTION=VALUE"))?;
        let key: SettingKey = key.trim().parse()?;
        let value: i64 = value.trim().parse()?;
        settings.set(&key, value);
    }
    Ok(())
}
