//! Seed data script - fills a dataset file with realistic demo chains
//!
//! Run with: cargo run --bin seed-data -- --count 12
//!
//! Every lot gets a transformation; roughly 80% of them also get a logistics
//! record, unless quality control rejected the batch. One in five shipments
//! carries a cold-chain excursion so the validators have something to report.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use clap::Parser;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

use agritrace::{
    config,
    models::{CultivationLot, DeliveryStatus, Logistics, QualityResult, Transformation},
    validation::trace_chain,
    Dataset, InMemoryStore, TraceabilityReader, TraceabilityStore,
};

const PRODUCT_TYPES: [&str; 6] = [
    "Mango Orgánico",
    "Mango Tommy Atkins",
    "Mango Ataulfo",
    "Aguacate Hass",
    "Limón Persa",
    "Naranja Valencia",
];

const FARMS: [&str; 6] = [
    "Finca San José, Valle Central",
    "Finca Los Pinos, Guanacaste",
    "Finca El Roble, Cartago",
    "Finca La Esperanza, Alajuela",
    "Finca Santa Fe, Puntarenas",
    "Finca Los Mangos, Limón",
];

const PEOPLE: [&str; 6] = [
    "Juan Pérez",
    "María González",
    "Carlos Ramírez",
    "Ana Martínez",
    "Roberto Sánchez",
    "Laura Fernández",
];

const SUPERMARKETS: [&str; 6] = [
    "Supermercado Central",
    "Walmart Costa Rica",
    "Auto Mercado",
    "Palí",
    "Mas x Menos",
    "Super Compro",
];

const PACKAGES: [&str; 4] = [
    "Caja de cartón",
    "Bolsa plástica",
    "Canasta de plástico",
    "Caja de madera",
];

const QUALITY_DRAW: [QualityResult; 5] = [
    QualityResult::Approved,
    QualityResult::Approved,
    QualityResult::Approved,
    QualityResult::Conditional,
    QualityResult::Rejected,
];

const STATUS_DRAW: [DeliveryStatus; 5] = [
    DeliveryStatus::Delivered,
    DeliveryStatus::Delivered,
    DeliveryStatus::Delivered,
    DeliveryStatus::InTransit,
    DeliveryStatus::Delayed,
];

#[derive(Parser)]
#[command(name = "seed-data", about = "Populate a traceability dataset with demo chains")]
struct Args {
    /// Number of lots to create
    #[arg(long, default_value_t = 12)]
    count: usize,

    /// Discard the existing dataset first
    #[arg(long)]
    clean: bool,

    /// RNG seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Dataset file to write instead of the configured one
    #[arg(long)]
    dataset: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::load_config().context("failed to load application config")?;
    config::init_tracing(&config.log_level, config.log_json);

    let path = args.dataset.clone().unwrap_or_else(|| config.dataset_path());
    let today = config.today();

    info!("=== Traceability Seed Data ===");

    let store = if args.clean {
        warn!("Discarding existing data in {}", path.display());
        InMemoryStore::new()
    } else {
        Dataset::load_or_default(&path)
            .and_then(Dataset::into_store)
            .with_context(|| format!("failed to load dataset {}", path.display()))?
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let first_number = next_lot_number(&store)?;
    let base_date = today - Duration::days(30);
    info!("Creating {} chains starting at lot number {}", args.count, first_number);

    let mut created = Vec::with_capacity(args.count);
    for i in 0..args.count {
        let number = first_number + i;
        let with_logistics = (i as f64) < args.count as f64 * 0.8;
        let lot_id = seed_chain(&store, &mut rng, number, i, base_date, with_logistics)?;
        created.push(lot_id);
    }

    Dataset::from_store(&store)?
        .save(&path)
        .with_context(|| format!("failed to write dataset {}", path.display()))?;

    let mut consistent = 0;
    let mut complete = 0;
    for lot_id in &created {
        let report = trace_chain(&store, *lot_id, today)?;
        if report.consistent {
            consistent += 1;
        }
        if report.complete {
            complete += 1;
        }
        if report.hard_violation_count() > 0 {
            info!(
                "  {} has {} violation(s)",
                report.lot_code,
                report.hard_violation_count()
            );
        }
    }

    let counts = store.counts()?;
    info!("=== Seed Data Complete ===");
    info!(
        "Dataset {} now holds {} lots, {} transformations, {} logistics records",
        path.display(),
        counts.lots,
        counts.transformations,
        counts.logistics
    );
    info!(
        "New chains: {} consistent, {} complete, {} total",
        consistent,
        complete,
        created.len()
    );

    Ok(())
}

/// Continues the numbering of `LOT-2024-NNN` codes already in the store.
fn next_lot_number(store: &InMemoryStore) -> Result<usize> {
    let highest = store
        .list_lots()?
        .iter()
        .filter_map(|lot| lot.code.rsplit('-').next()?.parse::<usize>().ok())
        .max()
        .unwrap_or(0);
    Ok(highest + 1)
}

fn pick<'a, R: Rng>(rng: &mut R, pool: &[&'a str]) -> &'a str {
    pool.choose(rng).copied().unwrap_or_default()
}

/// Hundredths in `[low, high]`, e.g. `cents(rng, 250, 1500)` is 2.50 to 15.00.
fn cents<R: Rng>(rng: &mut R, low: i64, high: i64) -> Decimal {
    Decimal::new(rng.gen_range(low..=high), 2)
}

fn seed_chain(
    store: &InMemoryStore,
    rng: &mut StdRng,
    number: usize,
    index: usize,
    base_date: NaiveDate,
    with_logistics: bool,
) -> Result<Uuid> {
    let harvest_date = base_date - Duration::days(rng.gen_range(0..=20));
    let mut code = format!("LOT-2024-{:03}", number);
    if store.find_lot_by_code(&code)?.is_some() {
        code = format!("{}-{}", code, rng.gen_range(100..1000));
    }

    let product = pick(rng, &PRODUCT_TYPES);
    let mut lot = CultivationLot::new(
        code,
        product,
        pick(rng, &FARMS),
        cents(rng, 250, 1500),
        harvest_date,
        pick(rng, &PEOPLE),
    );
    if product.contains("Orgánico") {
        lot = lot.organic(Some("Certificado orgánico".to_string()));
    }
    let lot = store.insert_lot(lot)?;
    info!("  Lot created: {}", lot.code);

    let washing_start = (harvest_date + Duration::days(1))
        .and_hms_opt(8, 0, 0)
        .context("invalid washing time")?;
    let washed_at = Utc.from_utc_datetime(&washing_start);
    let packaged_at = washed_at + Duration::hours(6);
    let quality_checked_at = packaged_at + Duration::hours(4);
    let quality = QUALITY_DRAW.choose(rng).copied().unwrap_or(QualityResult::Approved);

    let now = Utc::now();
    let transformation = store.insert_transformation(Transformation {
        id: Uuid::new_v4(),
        lot_id: lot.id,
        washed_at,
        washing_temperature: cents(rng, 1500, 3000),
        washing_responsible: pick(rng, &PEOPLE).to_string(),
        packaged_at,
        package_type: pick(rng, &PACKAGES).to_string(),
        unit_count: rng.gen_range(500..=5000),
        packaging_responsible: pick(rng, &PEOPLE).to_string(),
        quality_checked_at,
        quality_result: quality.to_string(),
        quality_observations: Some(
            if quality == QualityResult::Approved {
                "Inspection completed per protocol"
            } else {
                "Adjustments required"
            }
            .to_string(),
        ),
        quality_responsible: pick(rng, &PEOPLE).to_string(),
        created_at: now,
        updated_at: now,
    })?;
    info!("    Transformation created (quality: {})", quality);

    if !with_logistics || quality == QualityResult::Rejected {
        return Ok(lot.id);
    }

    let departed_at = quality_checked_at + Duration::hours(2);
    let delivered_at = departed_at + Duration::hours(rng.gen_range(8..=48));

    let min_temperature = cents(rng, 200, 500);
    let max_temperature = if index % 5 == 0 {
        cents(rng, 850, 1200)
    } else {
        cents(rng, 550, 800)
    };
    let avg_temperature = ((min_temperature + max_temperature) / dec!(2)).round_dp(2);

    let mut guide_number = format!("GUI-2024-{:04}", number);
    if store.all_logistics().iter().any(|l| l.guide_number == guide_number) {
        guide_number = format!("{}-{}", guide_number, rng.gen_range(10..100));
    }

    let status = STATUS_DRAW.choose(rng).copied().unwrap_or_default();
    let destination = pick(rng, &SUPERMARKETS);
    store.insert_logistics(Logistics {
        id: Uuid::new_v4(),
        transformation_id: transformation.id,
        guide_number,
        vehicle: format!("ABC-{}", rng.gen_range(100..1000)),
        driver: pick(rng, &PEOPLE).to_string(),
        min_temperature,
        max_temperature,
        avg_temperature,
        departed_at,
        delivered_at,
        destination: destination.to_string(),
        destination_address: format!("{}, San José", destination),
        status: status.to_string(),
        distance_km: Some(cents(rng, 5_000, 40_000)),
        transport_notes: None,
        created_at: now,
        updated_at: now,
    })?;
    info!("    Logistics created (status: {})", status);

    Ok(lot.id)
}
