//! floodscope: flood clustering dashboard
//!
//! This is the main entrypoint that loads the dashboard artifacts once and
//! runs the selected view: overview, regional analysis or prediction.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use floodscope::cli::{Command, PredictArgs};
use floodscope::{viz, ArtifactPaths, Args, DashboardContext, LabelMapping};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let args = Args::parse();
    init_tracing(args.verbose);

    let start_time = Instant::now();
    let paths = ArtifactPaths::from_args(&args);
    let context = DashboardContext::load(&paths, LabelMapping::new(args.severe_cluster))?;
    tracing::debug!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "artifacts loaded"
    );

    match &args.command {
        Command::Overview { output_dir } => run_overview(&context, output_dir)?,
        Command::Regions { top, output } => run_regional_analysis(&context, *top as usize, output)?,
        Command::Predict(input) => run_prediction(&context, input),
    }

    println!("\nFlood Clustering Dashboard - K-Means | Jakarta public flood data");

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "floodscope=debug"
    } else {
        "floodscope=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Category distribution, cluster comparison charts and per-cluster mean heatmap
fn run_overview(context: &DashboardContext, output_dir: &Path) -> Result<()> {
    println!("=== Flood Clustering Overview ===");
    println!("Events: {}", context.events.len());

    let counts = context.events.category_counts()?;
    viz::print_category_distribution(&counts);

    let profiles = context.events.cluster_profiles()?;
    viz::print_cluster_profiles(&profiles);

    let charts = viz::generate_overview_report(&context.events, output_dir)?;
    println!("\n✓ Overview charts generated");
    for chart in &charts {
        println!("  {}", chart.display());
    }

    Ok(())
}

/// Regions with the highest share of severe floods
fn run_regional_analysis(context: &DashboardContext, top_n: usize, output: &Path) -> Result<()> {
    println!("=== Flood Analysis per Region ===");

    let top = context.regions.top_regions(top_n)?;
    viz::print_region_table(&top)?;

    if top.entries.is_empty() {
        tracing::warn!("region dataset is empty, skipping chart");
        return Ok(());
    }

    viz::create_region_severity_chart(&top, output)?;
    println!("\n✓ Severe flood percentage chart saved to: {}", output.display());

    Ok(())
}

/// Predict the category of one hypothetical event
fn run_prediction(context: &DashboardContext, input: &PredictArgs) {
    println!("=== Flood Category Prediction ===");

    let features = input.feature_vector();
    println!("Input: {}", features);

    let category = context.predictor.predict(&features);

    println!("\nPrediction Result");
    if category.is_severe() {
        println!("⚠️  Category: {}", category.as_str().to_uppercase());
    } else {
        println!("✓ Category: {}", category.as_str().to_uppercase());
    }
}
