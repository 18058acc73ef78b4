use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use epias_analyzer::models::{MonthlySummary, PlantMeta};
use epias_analyzer::plants::{load_plants, plant_type, slugify};
use epias_analyzer::{
    build_monthly_summary, build_plant_table, build_report, compute_monthly_extras, EpiasClient,
};

#[derive(Parser)]
#[command(name = "epias_analyzer")]
#[command(about = "Fetch EPİAŞ market data and build a two-plant imbalance settlement workbook")]
struct Args {
    /// Plant list JSON (pp_list.json)
    #[arg(long, default_value = "pp_list.json")]
    plants_file: PathBuf,

    /// First plant name, as it appears in the plant list
    #[arg(long)]
    plant1: String,

    /// Second plant name; must be a different plant of the same type
    #[arg(long)]
    plant2: String,

    /// Range start (YYYY-MM-DD)
    #[arg(long)]
    start_date: String,

    /// Range end (YYYY-MM-DD), inclusive
    #[arg(long)]
    end_date: String,

    /// Transparency Platform username (ignored when --tgt is given)
    #[arg(long)]
    username: Option<String>,

    /// Transparency Platform password
    #[arg(long)]
    password: Option<String>,

    /// Pre-acquired TGT token, skips the login call (valid ~2 hours)
    #[arg(long)]
    tgt: Option<String>,

    /// Pacing delay between per-month requests for the plant series,
    /// in milliseconds; the price series use half of this
    #[arg(long, default_value = "200")]
    delay_ms: u64,

    /// Directory the workbook is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

fn parse_day(s: &str) -> Result<NaiveDateTime> {
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date {s:?}, expected YYYY-MM-DD"))?;
    day.and_hms_opt(0, 0, 0)
        .context("date has no midnight timestamp")
}

fn find_plant<'a>(plants: &'a [PlantMeta], name: &str) -> Result<&'a PlantMeta> {
    plants
        .iter()
        .find(|p| p.power_plant_name == name)
        .with_context(|| format!("plant {name:?} not found in the plant list"))
}

fn print_summary(name: &str, summary: &MonthlySummary) {
    println!("\n📊 {name}: annual totals");
    println!("  Production:        {:>16.2} MWh", summary.total.uretim);
    println!("  Day-ahead revenue: {:>16.2} TL", summary.total.gop_geliri);
    println!("  Net revenue:       {:>16.2} TL", summary.total.net_gelir);
    println!(
        "  Imbalance cost:    {:>16.2} TL ({:.2} TL/MWh)",
        summary.total.dengesizlik_maliyeti, summary.total.birim_deng_maliyeti
    );
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = parse_day(&args.start_date)?;
    let end = parse_day(&args.end_date)?;
    if end < start {
        bail!(
            "end date {} is before start date {}",
            args.end_date,
            args.start_date
        );
    }

    let plants = load_plants(&[args.plants_file.clone()])?;
    let plant1 = find_plant(&plants, &args.plant1)?;
    let plant2 = find_plant(&plants, &args.plant2)?;
    if plant1.power_plant_name == plant2.power_plant_name {
        bail!("pick two different plants");
    }
    if plant_type(&plant1.power_plant_name) != plant_type(&plant2.power_plant_name) {
        bail!("plants must be of the same type (HES/RES)");
    }

    let tgt = match args.tgt {
        Some(tgt) => tgt,
        None => {
            let username = args
                .username
                .as_deref()
                .context("either --tgt or --username/--password is required")?;
            let password = args
                .password
                .as_deref()
                .context("either --tgt or --username/--password is required")?;
            println!("🔑 Obtaining TGT token...");
            EpiasClient::obtain_tgt(username, password)?
        }
    };
    let client = EpiasClient::new(Some(tgt)).with_delays(
        Duration::from_millis(args.delay_ms / 2),
        Duration::from_millis(args.delay_ms),
    );

    println!("🚀 EPİAŞ Imbalance Settlement Analyzer");
    println!("{}", "=".repeat(60));
    println!(
        "Comparing {} vs {} over {} .. {}",
        plant1.power_plant_name, plant2.power_plant_name, args.start_date, args.end_date
    );

    let pb = ProgressBar::new(6);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    pb.set_message("fetching PTF");
    let ptf = client.fetch_ptf(start, end)?;
    pb.inc(1);
    pb.set_message("fetching SMF");
    let smf = client.fetch_smf(start, end)?;
    pb.inc(1);
    info!("fetched {} PTF and {} SMF points", ptf.len(), smf.len());

    // prices are fetched once and shared by both settlement runs
    let mut tables = Vec::new();
    for plant in [plant1, plant2] {
        pb.set_message(format!("fetching KGÜP: {}", plant.power_plant_name));
        let kgup = client.fetch_kgup(plant, start, end)?;
        pb.inc(1);
        pb.set_message(format!("fetching generation: {}", plant.power_plant_name));
        let uretim = client.fetch_uretim(plant, start, end)?;
        pb.inc(1);
        info!(
            "{}: {} plan and {} realized points",
            plant.power_plant_name,
            kgup.len(),
            uretim.len()
        );
        tables.push(build_plant_table(&kgup, &uretim, &ptf, &smf));
    }
    pb.finish_with_message("data ready");

    let rows2 = tables.pop().unwrap_or_default();
    let rows1 = tables.pop().unwrap_or_default();
    if rows1.is_empty() || rows2.is_empty() {
        let name = if rows1.is_empty() {
            &plant1.power_plant_name
        } else {
            &plant2.power_plant_name
        };
        bail!("no joined data for {name}; check the date range and token validity");
    }

    let summary1 = build_monthly_summary(&rows1);
    let summary2 = build_monthly_summary(&rows2);
    print_summary(&plant1.power_plant_name, &summary1);
    print_summary(&plant2.power_plant_name, &summary2);

    let year = start.year();
    let extras1 = compute_monthly_extras(&rows1, year);
    let extras2 = compute_monthly_extras(&rows2, year);

    println!("\n💾 Building workbook...");
    let bytes = build_report(&rows1, &extras1, &rows2, &extras2)?;

    let file_name = format!(
        "Analiz_{}_vs_{}_{}_{}.xlsx",
        slugify(&plant1.power_plant_name),
        slugify(&plant2.power_plant_name),
        start.format("%Y%m%d"),
        end.format("%Y%m%d"),
    );
    std::fs::create_dir_all(&args.output_dir)?;
    let out_path = args.output_dir.join(file_name);
    std::fs::write(&out_path, bytes)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    println!("✅ Report written to {}", out_path.display());
    Ok(())
}
