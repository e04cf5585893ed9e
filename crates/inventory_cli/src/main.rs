//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `inventory_core` linkage and a full insert/read cycle.
//! - Route core log events into `<temp>/inventory_cli/logs`.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `inventory_cli [config.toml]` (defaults to `inventory.toml`, then
//! to an in-memory store).

use inventory_core::config::DEFAULT_CONFIG_FILE;
use inventory_core::{
    init_logging, InsertOutcome, InventoryConfig, LogLevel, ProductService, ProductType,
    ProductValues, Route, Selection,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("inventory_core ping={}", inventory_core::ping());
    println!("inventory_core version={}", inventory_core::core_version());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("inventory_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = std::env::temp_dir().join("inventory_cli").join("logs");
    let level = LogLevel::build_default();
    init_logging(level.as_str(), &log_dir.to_string_lossy())?;
    println!("log_level={} log_dir={}", level.as_str(), log_dir.display());

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    let config = InventoryConfig::load(&config_path)?;
    let service = ProductService::from_config(&config);

    let sample = ProductValues::for_product(
        "Sample",
        "Smoke Test Supplier",
        "555-0100",
        ProductType::Goods,
        1,
        0,
    );
    let collection = service.router().collection_uri();
    match service.insert(&collection, &sample)? {
        InsertOutcome::Created(uri) => {
            println!("inserted={uri} type={}", service.type_of(&uri)?);
            if let Route::Item(id) = service.router().route(&uri)? {
                if let Some(product) = service.get(id)? {
                    println!("kind={}", product.kind.label());
                }
            }
            let deleted = service.delete(&uri, Selection::all())?;
            println!("cleanup_deleted={deleted}");
        }
        InsertOutcome::NoRowCreated => println!("inserted=none"),
    }
    println!("rows={}", service.count(&Selection::all())?);
    Ok(())
}
