//! Chart rendering with Plotters and table printing for the dashboard views

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::DataType;
use tracing::info;

use crate::data::{CategoryCount, ClusterProfile, EventDataset, TopRegions};
use crate::features::{Feature, FEATURE_COUNT};
use crate::predict::CategoryLabel;

const SEVERE_COLOR: RGBColor = RED;
const MINOR_COLOR: RGBColor = BLUE;

pub fn category_color(category: CategoryLabel) -> RGBColor {
    match category {
        CategoryLabel::SevereFlood => SEVERE_COLOR,
        CategoryLabel::MinorFlood => MINOR_COLOR,
    }
}

/// Upper bound of an axis starting at zero, with headroom
fn axis_max(values: impl IntoIterator<Item = f64>) -> f64 {
    let max = values.into_iter().fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// Item drawn at `row` of a chart whose row 0 is at the bottom, so that the
/// first item ends up on top
fn item_at_row<T>(items: &[T], row: usize) -> Option<&T> {
    items
        .len()
        .checked_sub(row + 1)
        .and_then(|idx| items.get(idx))
}

/// Bar chart of the number of events per category
pub fn create_category_distribution_chart(
    counts: &[CategoryCount],
    output_path: &Path,
) -> crate::Result<()> {
    if counts.is_empty() {
        anyhow::bail!("No events to plot");
    }

    let max_count = axis_max(counts.iter().map(|c| c.count as f64));

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Flood Category Distribution", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d((0..counts.len()).into_segmented(), 0f64..max_count)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Category")
        .y_desc("Number of Events")
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(idx) => counts
                .get(*idx)
                .map(|c| c.category.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(idx, c)| {
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(idx), 0.0),
                (SegmentValue::Exact(idx + 1), c.count as f64),
            ],
            category_color(c.category).filled(),
        );
        bar.set_margin(0, 0, 20, 20);
        bar
    }))?;

    root.present()?;
    info!(path = %output_path.display(), "category distribution chart saved");

    Ok(())
}

/// Water height against affected people, coloured by category
pub fn create_cluster_scatter(events: &EventDataset, output_path: &Path) -> crate::Result<()> {
    let records = events.records();
    let x_max = axis_max(records.iter().map(|r| r.features.water_height_cm));
    let y_max = axis_max(records.iter().map(|r| r.features.affected_people));

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Cluster Scatter Plot", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(Feature::WaterHeight.label())
        .y_desc(Feature::AffectedPeople.label())
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for category in CategoryLabel::ALL {
        let color = category_color(category);
        chart
            .draw_series(
                records
                    .iter()
                    .filter(|record| record.category == category)
                    .map(|record| {
                        Circle::new(
                            (
                                record.features.water_height_cm,
                                record.features.affected_people,
                            ),
                            4,
                            color.filled(),
                        )
                    }),
            )?
            .label(category.to_string())
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!(path = %output_path.display(), "cluster scatter plot saved");

    Ok(())
}

/// Box plot of one feature for each category
pub fn create_cluster_boxplot(
    events: &EventDataset,
    feature: Feature,
    output_path: &Path,
) -> crate::Result<()> {
    let groups = events.values_by_category(feature);
    if groups.is_empty() {
        anyhow::bail!("No events to plot");
    }

    let names: Vec<String> = groups.iter().map(|(c, _)| c.to_string()).collect();
    let keys: Vec<&str> = names.iter().map(String::as_str).collect();
    let y_max = axis_max(groups.iter().flat_map(|(_, values)| values.iter().copied())) as f32;

    let root = BitMapBackend::new(output_path, (600, 450)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} per Cluster", feature.label()), ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(keys[..].into_segmented(), 0f32..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Flood Category")
        .y_desc(feature.label())
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(groups.iter().zip(keys.iter()).map(|((category, values), key)| {
        let quartiles = Quartiles::new(values);
        Boxplot::new_vertical(SegmentValue::CenterOf(key), &quartiles)
            .width(40)
            .whisker_width(0.5)
            .style(category_color(*category))
    }))?;

    root.present()?;
    info!(path = %output_path.display(), feature = feature.column(), "cluster box plot saved");

    Ok(())
}

/// Horizontal bars of severe-flood percentage, highest region on top
pub fn create_region_severity_chart(top: &TopRegions, output_path: &Path) -> crate::Result<()> {
    let entries = &top.entries;
    if entries.is_empty() {
        anyhow::bail!("No regions to plot");
    }

    let n = entries.len();
    let x_max = axis_max(entries.iter().map(|e| e.severe_flood_pct));

    let root = BitMapBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Severe Flood Percentage", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(160)
        .build_cartesian_2d(0f64..x_max, (0..n - 1).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Percentage (%)")
        .y_labels(n)
        .y_label_formatter(&|value| match value {
            SegmentValue::CenterOf(row) => item_at_row(entries, *row)
                .map(|e| e.region.clone())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series((0..n).filter_map(|row| {
        let entry = item_at_row(entries, row)?;
        let mut bar = Rectangle::new(
            [
                (0.0, SegmentValue::Exact(row)),
                (entry.severe_flood_pct, SegmentValue::Exact(row + 1)),
            ],
            SEVERE_COLOR.mix(0.7).filled(),
        );
        bar.set_margin(3, 3, 0, 0);
        Some(bar)
    }))?;

    root.present()?;
    info!(path = %output_path.display(), regions = n, "region severity chart saved");

    Ok(())
}

/// Cell colour for a value at `fraction` of its column maximum
fn heat_color(fraction: f64) -> RGBColor {
    const LOW: (f64, f64, f64) = (255.0, 245.0, 235.0);
    const HIGH: (f64, f64, f64) = (180.0, 20.0, 40.0);

    let t = fraction.clamp(0.0, 1.0);
    let channel = |low: f64, high: f64| (low + (high - low) * t).round() as u8;
    RGBColor(
        channel(LOW.0, HIGH.0),
        channel(LOW.1, HIGH.1),
        channel(LOW.2, HIGH.2),
    )
}

/// Heatmap of the mean feature values per category, each cell annotated
/// with its mean
pub fn create_cluster_profile_heatmap(
    profiles: &[ClusterProfile],
    output_path: &Path,
) -> crate::Result<()> {
    if profiles.is_empty() {
        anyhow::bail!("No cluster profiles to plot");
    }

    let rows = profiles.len();
    // Features have unrelated units, so each column is shaded against its own maximum
    let column_max = Feature::ALL.map(|feature| {
        profiles
            .iter()
            .map(|profile| profile.means[feature.index()])
            .fold(0.0_f64, f64::max)
    });

    let cells: Vec<(usize, usize, f64, f64)> = (0..rows)
        .filter_map(|row| item_at_row(profiles, row).map(|profile| (row, profile)))
        .flat_map(|(row, profile)| {
            Feature::ALL.into_iter().map(move |feature| {
                let col = feature.index();
                let mean = profile.means[col];
                let fraction = if column_max[col] > 0.0 {
                    mean / column_max[col]
                } else {
                    0.0
                };
                (col, row, mean, fraction)
            })
        })
        .collect();

    let height = 160 + 90 * rows as u32;
    let root = BitMapBackend::new(output_path, (1100, height)).into_drawing_area();
    root.fill(&WHITE)?;

    // Segmented ranges include their end value, so 0..len-1 gives exactly len cells
    let mut chart = ChartBuilder::on(&root)
        .caption("Mean Feature Values per Cluster", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(120)
        .build_cartesian_2d(
            (0..FEATURE_COUNT - 1).into_segmented(),
            (0..rows - 1).into_segmented(),
        )?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(FEATURE_COUNT)
        .y_labels(rows)
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(idx) => Feature::ALL
                .get(*idx)
                .map(|feature| feature.column().to_string())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .y_label_formatter(&|value| match value {
            SegmentValue::CenterOf(row) => item_at_row(profiles, *row)
                .map(|profile| profile.category.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(cells.iter().map(|&(col, row, _, fraction)| {
        Rectangle::new(
            [
                (SegmentValue::Exact(col), SegmentValue::Exact(row)),
                (SegmentValue::Exact(col + 1), SegmentValue::Exact(row + 1)),
            ],
            heat_color(fraction).filled(),
        )
    }))?;

    chart.draw_series(cells.iter().map(|&(col, row, mean, fraction)| {
        let ink = if fraction > 0.6 { WHITE } else { BLACK };
        Text::new(
            format!("{:.1}", mean),
            (SegmentValue::CenterOf(col), SegmentValue::CenterOf(row)),
            ("sans-serif", 18)
                .into_font()
                .color(&ink)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        )
    }))?;

    root.present()?;
    info!(path = %output_path.display(), clusters = rows, "cluster profile heatmap saved");

    Ok(())
}

/// Render every overview chart into `output_dir`
pub fn generate_overview_report(
    events: &EventDataset,
    output_dir: &Path,
) -> crate::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let distribution = output_dir.join("category_distribution.png");
    create_category_distribution_chart(&events.category_counts()?, &distribution)?;

    let scatter = output_dir.join("cluster_scatter.png");
    create_cluster_scatter(events, &scatter)?;

    let height_box = output_dir.join("water_height_per_cluster.png");
    create_cluster_boxplot(events, Feature::WaterHeight, &height_box)?;

    let people_box = output_dir.join("affected_people_per_cluster.png");
    create_cluster_boxplot(events, Feature::AffectedPeople, &people_box)?;

    let profiles = output_dir.join("cluster_profiles.png");
    create_cluster_profile_heatmap(&events.cluster_profiles()?, &profiles)?;

    Ok(vec![distribution, scatter, height_box, people_box, profiles])
}

/// Print the event count of each category
pub fn print_category_distribution(counts: &[CategoryCount]) {
    let total: usize = counts.iter().map(|c| c.count).sum();

    println!("\n=== Flood Category Distribution ===");
    for c in counts {
        let percentage = if total > 0 {
            (c.count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {:<13} {:>6} events ({:.1}%)", c.category, c.count, percentage);
    }
}

/// Print the mean of every feature per category
pub fn print_cluster_profiles(profiles: &[ClusterProfile]) {
    println!("\n=== Mean Feature Values per Cluster ===");
    print!("  {:<13}", "Category");
    for feature in Feature::ALL {
        print!(" | {:>26}", feature.column());
    }
    println!();

    for profile in profiles {
        print!("  {:<13}", profile.category.to_string());
        for mean in profile.means {
            print!(" | {:>26.1}", mean);
        }
        println!();
    }
}

/// Every column of the top regions, one padded line per row
pub fn format_region_table(top: &TopRegions) -> crate::Result<String> {
    let frame = &top.frame;
    let columns = frame
        .get_columns()
        .iter()
        .map(|series| {
            let text = series.cast(&DataType::String)?;
            let cells: Vec<String> = text
                .str()?
                .into_iter()
                .map(|cell| cell.unwrap_or("").to_string())
                .collect();
            Ok((series.name().to_string(), cells))
        })
        .collect::<crate::Result<Vec<_>>>()?;

    let widths: Vec<usize> = columns
        .iter()
        .map(|(name, cells)| {
            cells
                .iter()
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render_line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        format!("  {}", padded.join(" | ").trim_end())
    };

    let mut lines = vec![render_line(columns.iter().map(|(name, _)| name.as_str()).collect())];
    lines.push(format!(
        "  {}",
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-")
    ));
    for row in 0..frame.height() {
        lines.push(render_line(
            columns
                .iter()
                .map(|(_, cells)| cells.get(row).map(String::as_str).unwrap_or(""))
                .collect(),
        ));
    }

    Ok(lines.join("\n"))
}

pub fn print_region_table(top: &TopRegions) -> crate::Result<()> {
    println!("\n=== Region Aggregates (top {}) ===", top.entries.len());
    println!("{}", format_region_table(top)?);
    Ok(())
}
