//! shapemap demo
//!
//! Defines a small car catalog at run time, persists one maker, one
//! propulsion type, and one model, then reads everything back.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod catalog;
mod config;
mod formatter;

use catalog::CarCatalog;
use clap::Parser;
use config::{Args, Backend, DemoConfig};
use formatter::Formatter;
use shapemap_core::{Mapper, MemoryStore, ShapeStore, StorageEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shapemap=info,shapemap_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = args.into_config();

    if let Err(e) = run(config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: DemoConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        backend = ?config.backend,
        data_path = %config.storage.path.display(),
        keep_data = config.keep_data,
        "configuration loaded"
    );

    let catalog = CarCatalog::define()?;
    let formatter = formatter::create_formatter(config.format);

    match config.backend {
        Backend::Sled => {
            let store = StorageEngine::open(config.storage.clone())?;
            if !config.keep_data {
                store.clear()?;
            }
            run_demo(&catalog, &store, &*formatter)?;
            store.flush()?;
        }
        Backend::Memory => {
            let enforce = config.storage.enforce_foreign_keys;
            let store = MemoryStore::new().with_foreign_keys(enforce);
            run_demo(&catalog, &store, &*formatter)?;
        }
    }

    Ok(())
}

fn run_demo<S: ShapeStore>(
    catalog: &CarCatalog,
    store: &S,
    formatter: &dyn Formatter,
) -> Result<(), Box<dyn std::error::Error>> {
    let mapper = Mapper::new(&catalog.bound, store);
    mapper.materialize()?;

    let batch = catalog.seed(&mapper)?;
    println!(
        "{}",
        formatter.format_message(&format!("inserted {} record(s)", batch.len()))
    );

    for shape in catalog.shapes() {
        let records = mapper.fetch_all(shape)?.collect::<Result<Vec<_>, _>>()?;
        println!("{}", formatter.format_records(shape.name(), shape, &records));
    }

    let makers = mapper
        .fetch_all(&catalog.maker)?
        .collect::<Result<Vec<_>, _>>()?;
    for maker in &makers {
        let models = mapper.fetch_related(maker, &catalog.model)?;
        let title = format!("Models of {}", maker.get_str("maker_name")?);
        println!("{}", formatter.format_records(&title, &catalog.model, &models));
    }

    Ok(())
}
