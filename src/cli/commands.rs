use std::path::Path;

use anyhow::{bail, Context, Result};

use flipdeck::config::Config;
use flipdeck::model::FeatureData;
use flipdeck::stores::DiffSlot;
use flipdeck::{Action, App, ResourceClient};

use super::{Cli, Command};

/// Run one command against the configured endpoint.
pub async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let mut config = Config::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?
        .apply_env()
        .with_api_key_override(cli.api_key.clone());
    if let Some(url) = &cli.endpoint {
        config.endpoint.url = Some(url.clone());
    }
    config.validate()?;

    if let Command::Login { remember_key } = cli.command {
        return login(config, &config_path, remember_key);
    }

    let client = ResourceClient::new(&config)?;
    if !client.ready() {
        bail!("No endpoint configured. Pass --endpoint or run `flipdeck login --endpoint <url>`");
    }

    let app = App::new(client);
    let _printer = app.events().all.subscribe(|event| {
        if let Some(text) = event.notification() {
            eprintln!("{}", text);
        }
    });

    app.fetch_channels()?;
    app.settle().await?;
    select(&app, cli.channel.as_deref(), cli.set.as_deref()).await?;

    match cli.command {
        Command::Login { .. } => unreachable!("handled before connecting"),
        Command::Channels => print_channels(&app),
        Command::Show => print_set(&app)?,
        Command::Diff { a, b } => {
            pick_diff_sets(&app, a.as_deref(), b.as_deref()).await?;
            print_diff(&app);
        }
        Command::Migrate {
            feature,
            direction,
            a,
            b,
        } => {
            pick_diff_sets(&app, a.as_deref(), b.as_deref()).await?;
            app.migrate(&feature, direction.into())
                .with_context(|| format!("cannot migrate '{}'", feature))?;
            app.settle().await?;
            print_diff(&app);
        }
        Command::AddFeature { name } => {
            require_set(&app)?;
            app.create_feature(&name)?;
            app.settle().await?;
        }
        Command::RmFeature { name } => {
            require_set(&app)?;
            app.delete_feature(&name)?;
            app.settle().await?;
        }
        Command::SetFeature {
            name,
            description,
            pct,
        } => {
            require_set(&app)?;
            let mut data = app
                .feature_set()
                .snapshot()
                .and_then(|doc| doc.features.get(&name).cloned())
                .with_context(|| format!("feature '{}' not found", name))?;
            if let Some(description) = description {
                data.description = description;
            }
            if let Some(pct) = pct {
                data.pct_users = pct;
            }
            app.save_feature_change(&name, data)?;
            app.settle().await?;
        }
        Command::AddAlias { alias } => {
            require_set(&app)?;
            app.create_alias(&alias)?;
            app.settle().await?;
        }
        Command::RmAlias { alias } => {
            require_set(&app)?;
            app.delete_alias(&alias)?;
            app.settle().await?;
        }
        Command::NewChannel { name } => {
            app.create_channel(&name)?;
            app.settle().await?;
        }
        Command::NewSet { name } => {
            app.create_feature_set(&name)?;
            app.settle().await?;
        }
        Command::DeleteSet { yes } => {
            let set = require_set(&app)?;
            app.prompt_confirmation(
                format!("Delete feature set {}?", set),
                Action::DeleteFeatureSet,
            )?;
            if yes {
                app.confirm()?;
            } else {
                app.cancel()?;
                eprintln!("Not deleted. Pass --yes to delete {}", set);
            }
            app.settle().await?;
        }
    }

    Ok(())
}

fn login(mut config: Config, path: &Path, remember_key: bool) -> Result<()> {
    if config.endpoint.url.is_none() {
        bail!("--endpoint is required");
    }
    if !remember_key {
        config.endpoint.api_key = None;
    }
    config.save_to(path)?;
    println!("Saved endpoint to {}", path.display());
    Ok(())
}

async fn select(app: &App, channel: Option<&str>, set: Option<&str>) -> Result<()> {
    if let Some(channel) = channel {
        if !app.selection().channels().contains_key(channel) {
            bail!("Unknown channel '{}'", channel);
        }
        app.select_channel(channel)?;
        app.settle().await?;
    }
    if let Some(set) = set {
        if !app.selection().feature_sets().iter().any(|s| s == set) {
            bail!("Unknown feature set '{}'", set);
        }
        app.select_set(set)?;
        app.settle().await?;
    }
    Ok(())
}

fn require_set(app: &App) -> Result<String> {
    match app.selection().current_set() {
        Some(set) => Ok(set.to_string()),
        None => bail!("No feature set selected"),
    }
}

/// Point the diff slots at `a` and `b`, in whichever order avoids showing
/// the same set on both sides in between.
async fn pick_diff_sets(app: &App, a: Option<&str>, b: Option<&str>) -> Result<()> {
    let a_first = a.is_some() && app.diff().slot_name(DiffSlot::B) != a;
    let order = if a_first {
        [(DiffSlot::A, a), (DiffSlot::B, b)]
    } else {
        [(DiffSlot::B, b), (DiffSlot::A, a)]
    };
    for (slot, set) in order {
        if let Some(set) = set {
            app.select_diff_set(slot, set)?;
        }
    }
    app.settle().await?;
    Ok(())
}

fn print_channels(app: &App) {
    let selection = app.selection();
    for channel in selection.channel_names() {
        let marker = if selection.current_channel() == Some(channel) {
            "*"
        } else {
            " "
        };
        println!("{} {}", marker, channel);
        let mut sets = selection.channels()[channel].clone();
        sets.sort();
        for set in sets {
            println!("    {}", set);
        }
    }
}

fn print_set(app: &App) -> Result<()> {
    let set = require_set(app)?;
    let store = app.feature_set();
    let Some(doc) = store.snapshot() else {
        bail!("Feature set {} could not be loaded", set);
    };

    let version = store
        .version()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("{} (version {})", set, version);
    for (name, FeatureData { description, pct_users }) in &doc.features {
        println!("  {:<30} {:>6.1}%  {}", name, pct_users * 100.0, description);
    }

    let alias_store = app.aliases();
    let aliases: Vec<&str> = alias_store.aliases().collect();
    if !aliases.is_empty() {
        println!("aliases: {}", aliases.join(", "));
    }
    Ok(())
}

fn print_diff(app: &App) {
    let diff = app.diff();
    let a = diff.slot_name(DiffSlot::A).unwrap_or("-");
    let b = diff.slot_name(DiffSlot::B).unwrap_or("-");

    println!("Only in {}:", a);
    for name in diff.a_minus_b() {
        println!("  {}", name);
    }
    println!("In both:");
    for name in diff.a_intersect_b() {
        println!("  {}", name);
    }
    println!("Only in {}:", b);
    for name in diff.b_minus_a() {
        println!("  {}", name);
    }
}
