use anstyle::{AnsiColor, Color, Style};
use pnl_forecast::{CopyReport, FillReport, Month, SectionAggregate, Version};

fn styles() -> (Style, Style, Style) {
    let added = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
    let changed = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
    (added, changed, Style::new())
}

pub fn show_fill(report: &FillReport) {
    let (added, changed, reset) = styles();
    if report.forecast_months.is_empty() {
        println!("All months are actual, nothing to fill.");
        return;
    }

    let first = report.forecast_months[0];
    let last = report.forecast_months[report.forecast_months.len() - 1];
    println!("{}━━━ Forecast {first}..{last} ━━━{}", Style::new().bold(), reset);
    if report.updated_count == 0 && report.inserted_count == 0 {
        println!("✓ Already up to date!");
        return;
    }
    println!("  {changed}{}{reset} row(s) updated", report.updated_count);
    println!("  {added}{}{reset} row(s) inserted", report.inserted_count);
}

pub fn show_copy(report: &CopyReport) {
    let (added, changed, reset) = styles();
    if *report == CopyReport::default() {
        println!("✓ Structure already matches!");
        return;
    }
    println!("  {added}{}{reset} row(s) inserted", report.inserted_count);
    println!("  {changed}{}{reset} row(s) moved", report.reordered_count);
}

pub fn show_aggregate(aggregate: &SectionAggregate) {
    let bold = Style::new().bold();
    let reset = Style::new();

    print!("{bold}{:<16}{reset}", aggregate.section);
    for month in Month::ALL {
        print!("{bold}{:>12}{reset}", month.to_string());
    }
    println!();
    for department in &aggregate.departments {
        print!("{:<16}", department.department);
        for (_, value) in department.months.iter() {
            print!("{value:>12.2}");
        }
        println!();
    }
    print!("{bold}{:<16}{reset}", "total");
    for (_, value) in aggregate.total.iter() {
        print!("{bold}{value:>12.2}{reset}");
    }
    println!();
}

pub fn show_versions(versions: &[Version]) {
    let (_, changed, reset) = styles();
    if versions.is_empty() {
        println!("No saved versions.");
        return;
    }
    for version in versions {
        let lock = if version.is_locked {
            format!(" {changed}locked{reset}")
        } else {
            String::new()
        };
        println!(
            "{:>4}  {:<20} {:>2} actual{lock}",
            version.id, version.version_name, version.actual_months
        );
        if let Some(notes) = &version.notes {
            println!("      {notes}");
        }
    }
}
