#![allow(dead_code)]

use revenue_forecast::cells::Cell;

pub const HEADERS: [&str; 12] = [
    "Year",
    "Week",
    "Payer",
    "E&M Group",
    "Payments % of Total",
    "Avg Payment",
    "Avg E&M Weight",
    "Charge Amount",
    "Collection %",
    "Payments Expected",
    "Visit Count",
    "Visits With Lab Count",
];

pub fn header_row() -> Vec<Cell> {
    HEADERS.iter().map(|h| Cell::text(*h)).collect()
}

/// One billing line. `year`/`week`/`payer` may be blank to exercise carry-forward.
pub fn line(
    year: &str,
    week: &str,
    payer: &str,
    charge: f64,
    payments: f64,
    visits: f64,
) -> Vec<Cell> {
    vec![
        Cell::text(year),
        Cell::text(week),
        Cell::text(payer),
        Cell::text("99213"),
        Cell::text(""),
        Cell::Number(if visits > 0.0 { payments / visits } else { 0.0 }),
        Cell::Number(1.3),
        Cell::Number(charge),
        Cell::text(format!("{}%", if charge > 0.0 { payments / charge * 100.0 } else { 0.0 })),
        Cell::Number(payments),
        Cell::Number(visits),
        Cell::Number((visits / 4.0).floor()),
    ]
}

/// Weekly charges with enough spread to give the test weeks some variance.
pub fn weekly_charge(week: usize) -> f64 {
    5_000.0 + 700.0 * week as f64 + (week % 3) as f64 * 400.0
}

/// `weeks` weeks of data where payments are exactly 80% of charges and visit
/// counts carry no revenue signal. Each week has a BCBS and a self-pay line,
/// and every even week an Aetna line.
pub fn linear_collection_rows(weeks: usize) -> Vec<Vec<Cell>> {
    let mut rows = vec![header_row()];
    for w in 1..=weeks {
        let total = weekly_charge(w);
        let label = format!("W{w:02}");
        let visits = 20.0 + ((w * 7) % 5) as f64;
        rows.push(line("2024", &label, "2-BCBS", total * 0.5, total * 0.5 * 0.8, visits));
        rows.push(line("", "", "1-SELF PAY", total * 0.3, total * 0.3 * 0.8, visits));
        if w % 2 == 0 {
            rows.push(line("", "", "17-AETNA", total * 0.2, total * 0.2 * 0.8, visits));
        } else {
            rows.push(line("", "", "5-COMMERCIAL", total * 0.2, total * 0.2 * 0.8, visits));
        }
    }
    rows
}
