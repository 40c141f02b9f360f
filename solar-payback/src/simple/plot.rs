use plotters::prelude::*;
use pv_model::{MonthlyConsumption, ProjectionSummary};
use std::path::Path;
use tracing::info;

const ORANGE: RGBColor = RGBColor(255, 165, 0);

fn value_range<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
        (min.min(v), max.max(v))
    })
}

/// Plot the cumulative cash flow per year against the investment cost
///
/// # Arguments
/// * `summary` - projection to draw
/// * `investment_cost` - drawn as a horizontal line, payback is where the curves cross
/// * `title` - chart caption
/// * `filename` - PNG file to write
pub fn plot_cash_flow(
    summary: &ProjectionSummary,
    investment_cost: f64,
    title: &str,
    filename: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if summary.years.is_empty() {
        return Err("Cannot plot an empty projection".into());
    }

    let root = BitMapBackend::new(filename, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let (min_val, max_val) = value_range(
        summary
            .years
            .iter()
            .map(|row| &row.cumulative_cash_flow)
            .chain(std::iter::once(&investment_cost)),
    );
    let last_year = summary.years.len() as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(0f64..last_year + 1.0, min_val.min(0.0)..max_val * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Cumulative cash flow [NOK]")
        .x_label_formatter(&|x| format!("{:.0}", x))
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            summary
                .years
                .iter()
                .map(|row| (row.year as f64, row.cumulative_cash_flow)),
            BLUE.stroke_width(3),
        ))?
        .label("Cumulative cash flow")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], BLUE.stroke_width(3)));

    chart
        .draw_series(LineSeries::new(
            [(0.0, investment_cost), (last_year + 1.0, investment_cost)],
            RED.stroke_width(2),
        ))?
        .label("Investment cost")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], RED.stroke_width(2)));

    if let Some(payback) = summary.payback_years {
        let index = payback as usize - 1;
        chart.draw_series(std::iter::once(Circle::new(
            (payback as f64, summary.years[index].cumulative_cash_flow),
            6,
            GREEN.filled(),
        )))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    info!(path = %filename.display(), "cash flow plot saved");
    Ok(())
}

/// Plot production, self-consumption and export per projection year
pub fn plot_yearly_energy(
    summary: &ProjectionSummary,
    filename: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if summary.years.is_empty() {
        return Err("Cannot plot an empty projection".into());
    }

    let root = BitMapBackend::new(filename, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let (_, max_val) = value_range(summary.years.iter().map(|row| &row.production_kwh));

    let mut chart = ChartBuilder::on(&root)
        .caption("Yearly energy", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..summary.years.len() as f64 + 1.0, 0f64..max_val * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Energy [kWh]")
        .x_label_formatter(&|x| format!("{:.0}", x))
        .draw()?;

    chart
        .draw_series(summary.years.iter().map(|row| {
            let x = row.year as f64;
            Rectangle::new(
                [(x - 0.35, 0.0), (x, row.self_consumption_kwh)],
                BLUE.filled(),
            )
        }))?
        .label("Self-consumption")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &BLUE));

    chart
        .draw_series(summary.years.iter().map(|row| {
            let x = row.year as f64;
            Rectangle::new([(x, 0.0), (x + 0.35, row.exported_kwh)], ORANGE.filled())
        }))?
        .label("Export")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &ORANGE));

    chart
        .draw_series(LineSeries::new(
            summary
                .years
                .iter()
                .map(|row| (row.year as f64, row.production_kwh)),
            RED.stroke_width(2),
        ))?
        .label("Production")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], RED.stroke_width(2)));

    chart.configure_series_labels().draw()?;

    root.present()?;
    info!(path = %filename.display(), "yearly energy plot saved");
    Ok(())
}

/// Plot the metered monthly consumption of a household against the average profile
pub fn plot_monthly_consumption(
    actual: &MonthlyConsumption,
    average: &MonthlyConsumption,
    filename: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let actual = actual.to_array();
    let average = average.to_array();

    let root = BitMapBackend::new(filename, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let (_, max_val) = value_range(actual.iter().chain(average.iter()));

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly consumption", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(1f64..12f64, 0f64..max_val * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Month")
        .y_desc("Consumption [kWh]")
        .x_label_formatter(&|x| format!("{:.0}", x))
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            (1..=12).map(|m| m as f64).zip(average.iter().copied()),
            &BLUE,
        ))?
        .label("Average household consumption")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &BLUE));

    chart
        .draw_series(LineSeries::new(
            (1..=12).map(|m| m as f64).zip(actual.iter().copied()),
            &RED,
        ))?
        .label("Actual consumption per month")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &RED));

    chart.configure_series_labels().draw()?;

    root.present()?;
    info!(path = %filename.display(), "monthly consumption plot saved");
    Ok(())
}

/// Print the key figures and the yearly ledger of a projection
pub fn print_projection_summary(summary: &ProjectionSummary, investment_cost: f64) {
    println!("\n=== PROJECTION SUMMARY ===");
    println!("Investment cost: {:.2} NOK", investment_cost);
    println!("Total production: {:.0} kWh", summary.total_production_kwh());
    println!("Total income: {:.2} NOK", summary.total_income());
    println!(
        "Cumulative cash flow: {:.2} NOK",
        summary.final_cumulative_cash_flow()
    );
    println!("Total profit: {:.2} NOK", summary.total_profit);
    match summary.payback_years {
        Some(years) => println!("Payback period: {} years", years),
        None => println!("Payback period: not reached"),
    }

    println!(
        "\n{:>4} {:>12} {:>12} {:>12} {:>12} {:>14}",
        "year", "production", "self_cons", "exported", "income", "cumulative"
    );
    for row in &summary.years {
        println!(
            "{:>4} {:>12.1} {:>12.1} {:>12.1} {:>12.2} {:>14.2}",
            row.year,
            row.production_kwh,
            row.self_consumption_kwh,
            row.exported_kwh,
            row.income,
            row.cumulative_cash_flow
        );
    }
    println!("==========================\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range() {
        let values = [3.0, -1.0, 7.5];
        assert_eq!(value_range(values.iter()), (-1.0, 7.5));
    }

    #[test]
    fn test_empty_projection_is_not_plotted() {
        let summary = ProjectionSummary {
            years: Vec::new(),
            total_profit: 0.0,
            payback_years: None,
        };
        let dir = tempfile::tempdir().unwrap();

        assert!(plot_cash_flow(&summary, 1.0, "empty", &dir.path().join("cash.png")).is_err());
        assert!(plot_yearly_energy(&summary, &dir.path().join("energy.png")).is_err());
    }
}
