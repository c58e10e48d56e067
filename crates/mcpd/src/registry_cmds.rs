//! `mcpd search` and `mcpd add`.

use anyhow::{Context, Result, bail};
use mcpd_config::cache::DEFAULT_TTL;
use mcpd_config::{ManifestCache, RegistryManifest, ServerEntry, StaticConfig, parse_package};

use crate::cli::{AddArgs, SearchArgs};

pub async fn run_search(args: SearchArgs) -> Result<()> {
    let cache = if args.no_cache {
        ManifestCache::disabled()
    } else {
        let dir = args
            .cache_dir
            .unwrap_or_else(mcpd_config::default_cache_dir);
        ManifestCache::new(dir, DEFAULT_TTL)
    };

    let body = cache.fetch(&args.registry_url).await?;
    let manifest = RegistryManifest::parse(&body)
        .with_context(|| format!("registry at {} returned an invalid manifest", args.registry_url))?;

    let hits = manifest.search(&args.query);
    if hits.is_empty() {
        println!("no servers matching '{}'", args.query);
        return Ok(());
    }
    for entry in hits {
        match &entry.description {
            Some(description) => println!("{}  {}  — {}", entry.name, entry.package, description),
            None => println!("{}  {}", entry.name, entry.package),
        }
    }
    Ok(())
}

pub fn run_add(args: AddArgs) -> Result<()> {
    // Fail on a bad package shape before touching the config file.
    parse_package(&args.package)?;
    if args.tools.iter().all(|tool| tool.trim().is_empty()) {
        bail!("at least one non-empty --tool is required");
    }

    let path = args
        .config_file
        .unwrap_or_else(mcpd_config::default_config_path);
    let mut config = StaticConfig::load(&path)?;
    config.upsert(ServerEntry {
        name: args.name.clone(),
        package: args.package,
        tools: args.tools,
        ..ServerEntry::default()
    });
    config.save(&path)?;

    println!("server '{}' written to {}", args.name, path.display());
    println!("send SIGHUP to a running mcpd to apply it");
    Ok(())
}
