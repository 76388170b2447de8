use anyhow::{bail, Context, Result};
use catalog::Catalog;
use renderer::GalleryConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let catalog = match &cli.manifest {
        Some(path) => {
            let catalog = Catalog::from_manifest(path)
                .with_context(|| format!("failed to load manifest {}", path.display()))?;
            tracing::info!(manifest = %path.display(), shaders = catalog.len(), "loaded gallery manifest");
            catalog
        }
        None => Catalog::builtin(),
    };

    if cli.list {
        print_catalog(&catalog);
        return Ok(());
    }

    if let Some(id) = &cli.shader {
        if catalog.position(id).is_none() {
            bail!(
                "unknown shader `{id}`; run with --list to see the available entries"
            );
        }
    }

    let config = GalleryConfig {
        surface_size: cli.size,
        initial_shader: cli.shader,
        overlay: cli.overlay,
        ..GalleryConfig::default()
    };

    renderer::run(config, catalog)
}

fn print_catalog(catalog: &Catalog) {
    println!("Available shaders:");
    for (index, shader) in catalog.shaders().iter().enumerate() {
        println!("  {:>2}. {:<12} {}", index + 1, shader.id, shader.name);
        for parameter in &shader.parameters {
            println!(
                "      {:<14} {} [{} .. {}] step {} default {}",
                parameter.name,
                parameter.label,
                parameter.min,
                parameter.max,
                parameter.step,
                parameter.default
            );
        }
    }
}
