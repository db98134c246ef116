//! Record extraction: raw cell rows -> typed [`BillingRecord`]s.
//!
//! Column positions are resolved once per table from [`COLUMN_RULES`]: a header
//! keyword match wins, otherwise the rule's fixed spreadsheet column is used.
//! `year`, `week` and `payer` are carried forward across rows because the source
//! sheets use merged cells for those groupings.

use serde::{Deserialize, Serialize};

use crate::cells::Cell;
use crate::common::safe_div;
use crate::constants::MAX_COLLECTION_PCT;
use crate::error::{ForecastError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingRecord {
    pub year: String,
    pub week: String,
    pub payer: String,
    pub em_group: String,
    pub payments_pct_of_total: f64,
    pub avg_payment: f64,
    pub avg_em_weight: f64,
    pub charge_amount: f64,
    pub collection_pct: f64,
    pub total_payments: f64,
    pub visit_count: f64,
    pub visits_with_lab_count: f64,
    pub pct_visits_with_labs: f64,
    pub payment_per_visit: f64,
}

impl BillingRecord {
    pub fn passes_validation(&self) -> bool {
        self.total_payments >= 0.0
            && self.charge_amount >= 0.0
            && self.visit_count >= 0.0
            && (0.0..=MAX_COLLECTION_PCT).contains(&self.collection_pct)
    }
}

/// Numeric columns of a [`BillingRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    PaymentsPctOfTotal,
    AvgPayment,
    AvgEmWeight,
    ChargeAmount,
    CollectionPct,
    TotalPayments,
    VisitCount,
    VisitsWithLabCount,
    PctVisitsWithLabs,
    PaymentPerVisit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Currency,
    Percent,
    Count,
    Weight,
}

impl RecordField {
    pub const ALL: [RecordField; 10] = [
        RecordField::PaymentsPctOfTotal,
        RecordField::AvgPayment,
        RecordField::AvgEmWeight,
        RecordField::ChargeAmount,
        RecordField::CollectionPct,
        RecordField::TotalPayments,
        RecordField::VisitCount,
        RecordField::VisitsWithLabCount,
        RecordField::PctVisitsWithLabs,
        RecordField::PaymentPerVisit,
    ];

    pub fn value(self, record: &BillingRecord) -> f64 {
        match self {
            RecordField::PaymentsPctOfTotal => record.payments_pct_of_total,
            RecordField::AvgPayment => record.avg_payment,
            RecordField::AvgEmWeight => record.avg_em_weight,
            RecordField::ChargeAmount => record.charge_amount,
            RecordField::CollectionPct => record.collection_pct,
            RecordField::TotalPayments => record.total_payments,
            RecordField::VisitCount => record.visit_count,
            RecordField::VisitsWithLabCount => record.visits_with_lab_count,
            RecordField::PctVisitsWithLabs => record.pct_visits_with_labs,
            RecordField::PaymentPerVisit => record.payment_per_visit,
        }
    }

    fn set(self, record: &mut BillingRecord, value: f64) {
        let slot = match self {
            RecordField::PaymentsPctOfTotal => &mut record.payments_pct_of_total,
            RecordField::AvgPayment => &mut record.avg_payment,
            RecordField::AvgEmWeight => &mut record.avg_em_weight,
            RecordField::ChargeAmount => &mut record.charge_amount,
            RecordField::CollectionPct => &mut record.collection_pct,
            RecordField::TotalPayments => &mut record.total_payments,
            RecordField::VisitCount => &mut record.visit_count,
            RecordField::VisitsWithLabCount => &mut record.visits_with_lab_count,
            RecordField::PctVisitsWithLabs => &mut record.pct_visits_with_labs,
            RecordField::PaymentPerVisit => &mut record.payment_per_visit,
        };
        *slot = value;
    }

    /// Human-readable metric name used in narratives.
    pub fn label(self) -> &'static str {
        match self {
            RecordField::PaymentsPctOfTotal => "share of total payments",
            RecordField::AvgPayment => "average payment",
            RecordField::AvgEmWeight => "average E&M weight",
            RecordField::ChargeAmount => "charge amount",
            RecordField::CollectionPct => "collection rate",
            RecordField::TotalPayments => "total payments",
            RecordField::VisitCount => "visit count",
            RecordField::VisitsWithLabCount => "visits with labs",
            RecordField::PctVisitsWithLabs => "lab utilization",
            RecordField::PaymentPerVisit => "payment per visit",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            RecordField::AvgPayment
            | RecordField::ChargeAmount
            | RecordField::TotalPayments
            | RecordField::PaymentPerVisit => ValueKind::Currency,
            RecordField::PaymentsPctOfTotal
            | RecordField::CollectionPct
            | RecordField::PctVisitsWithLabs => ValueKind::Percent,
            RecordField::VisitCount | RecordField::VisitsWithLabCount => ValueKind::Count,
            RecordField::AvgEmWeight => ValueKind::Weight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Year,
    Week,
    Payer,
    EmGroup,
    Numeric(RecordField),
}

struct ColumnRule {
    column: Column,
    /// Alternative keyword sets; a header matches when it contains every keyword of one set.
    keywords: &'static [&'static [&'static str]],
    excludes: &'static [&'static str],
    /// Spreadsheet column used when no header matches (A = 0).
    fallback: Option<usize>,
}

// More specific rules come first: a header is claimed by the first rule it satisfies.
const COLUMN_RULES: &[ColumnRule] = &[
    ColumnRule {
        column: Column::Year,
        keywords: &[&["year"]],
        excludes: &[],
        fallback: Some(0),
    },
    ColumnRule {
        column: Column::Week,
        keywords: &[&["week"]],
        excludes: &[],
        fallback: Some(1),
    },
    ColumnRule {
        column: Column::Payer,
        keywords: &[&["payer"], &["financial class"], &["insurance"]],
        excludes: &["%", "payment"],
        fallback: Some(2),
    },
    ColumnRule {
        column: Column::EmGroup,
        keywords: &[&["e&m"], &["e/m"], &["em group"], &["em level"]],
        excludes: &["weight", "avg", "average"],
        fallback: Some(3),
    },
    ColumnRule {
        column: Column::Numeric(RecordField::PctVisitsWithLabs),
        keywords: &[&["lab", "%"], &["lab", "pct"], &["lab", "percent"]],
        excludes: &[],
        fallback: None,
    },
    ColumnRule {
        column: Column::Numeric(RecordField::VisitsWithLabCount),
        keywords: &[&["lab", "count"]],
        excludes: &[],
        fallback: Some(11),
    },
    ColumnRule {
        column: Column::Numeric(RecordField::VisitCount),
        keywords: &[&["visit", "count"]],
        excludes: &["lab"],
        fallback: Some(10),
    },
    ColumnRule {
        column: Column::Numeric(RecordField::PaymentPerVisit),
        keywords: &[&["payment", "per visit"]],
        excludes: &["charge"],
        fallback: None,
    },
    ColumnRule {
        column: Column::Numeric(RecordField::PaymentsPctOfTotal),
        keywords: &[&["payment", "%"], &["payment", "pct"], &["payment", "percent"]],
        excludes: &["expected", "collection", "avg", "average"],
        fallback: Some(4),
    },
    ColumnRule {
        column: Column::Numeric(RecordField::CollectionPct),
        keywords: &[&["collection", "%"], &["collection", "pct"], &["collection", "rate"]],
        excludes: &[],
        fallback: Some(8),
    },
    ColumnRule {
        column: Column::Numeric(RecordField::TotalPayments),
        keywords: &[&["payment", "expected"], &["total", "payment"]],
        excludes: &["%", "avg", "average", "per"],
        fallback: Some(9),
    },
    ColumnRule {
        column: Column::Numeric(RecordField::AvgPayment),
        keywords: &[&["avg", "payment"], &["average", "payment"]],
        excludes: &["%"],
        fallback: Some(5),
    },
    ColumnRule {
        column: Column::Numeric(RecordField::AvgEmWeight),
        keywords: &[&["weight"]],
        excludes: &[],
        fallback: Some(6),
    },
    ColumnRule {
        column: Column::Numeric(RecordField::ChargeAmount),
        keywords: &[&["charge", "amount"]],
        excludes: &["per"],
        fallback: Some(7),
    },
];

impl ColumnRule {
    fn matches(&self, header: &str) -> bool {
        !self.excludes.iter().any(|x| header.contains(x))
            && self
                .keywords
                .iter()
                .any(|set| set.iter().all(|k| header.contains(k)))
    }
}

/// Resolved column index for every field of a [`BillingRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub year: usize,
    pub week: usize,
    pub payer: usize,
    pub em_group: usize,
    numeric: Vec<(RecordField, Option<usize>)>,
}

impl ColumnMap {
    pub fn from_headers(headers: &[Cell]) -> Result<Self> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|c| c.label().unwrap_or_default().to_lowercase())
            .collect();
        let mut claimed = vec![false; normalized.len()];
        let mut matched: Vec<Option<usize>> = Vec::with_capacity(COLUMN_RULES.len());

        for rule in COLUMN_RULES {
            let found = normalized
                .iter()
                .enumerate()
                .find(|(idx, h)| !claimed[*idx] && !h.is_empty() && rule.matches(h))
                .map(|(idx, _)| idx);
            if let Some(idx) = found {
                claimed[idx] = true;
            }
            matched.push(found);
        }

        // Positional fallbacks never reuse a column a header match already took.
        let resolved: Vec<(Column, Option<usize>)> = COLUMN_RULES
            .iter()
            .zip(matched)
            .map(|(rule, found)| {
                let idx = found.or_else(|| {
                    rule.fallback
                        .filter(|idx| claimed.get(*idx).is_none_or(|taken| !*taken))
                });
                (rule.column, idx)
            })
            .collect();

        let key_index = |column: Column, name: &str| -> Result<usize> {
            resolved
                .iter()
                .find(|(c, _)| *c == column)
                .and_then(|(_, idx)| *idx)
                .filter(|idx| *idx < headers.len())
                .ok_or_else(|| {
                    ForecastError::data_format(format!("input table has no {name} column"))
                })
        };

        Ok(Self {
            year: key_index(Column::Year, "year")?,
            week: key_index(Column::Week, "week")?,
            payer: key_index(Column::Payer, "payer")?,
            em_group: key_index(Column::EmGroup, "E&M group")?,
            numeric: resolved
                .iter()
                .filter_map(|(column, idx)| match column {
                    Column::Numeric(field) => Some((*field, *idx)),
                    _ => None,
                })
                .collect(),
        })
    }

    pub fn index_of(&self, field: RecordField) -> Option<usize> {
        self.numeric
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, idx)| *idx)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    pub rows_seen: usize,
    pub accepted: usize,
    pub skipped_missing_keys: usize,
    pub rejected_validation: usize,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub records: Vec<BillingRecord>,
    pub summary: ExtractionSummary,
}

#[derive(Default)]
struct CarryForward {
    year: Option<String>,
    week: Option<String>,
    payer: Option<String>,
}

fn carry(slot: &mut Option<String>, cell: Option<&Cell>) -> Option<String> {
    if let Some(value) = cell.and_then(Cell::label) {
        *slot = Some(value);
    }
    slot.clone()
}

pub fn extract_records(rows: &[Vec<Cell>]) -> Result<Extraction> {
    let Some((headers, data)) = rows.split_first() else {
        return Err(ForecastError::data_format("input table is empty"));
    };
    if data.is_empty() {
        return Err(ForecastError::data_format(
            "input table has a header row but no data rows",
        ));
    }

    let columns = ColumnMap::from_headers(headers)?;
    let mut carried = CarryForward::default();
    let mut summary = ExtractionSummary::default();
    let mut records = Vec::with_capacity(data.len());

    for row in data {
        summary.rows_seen += 1;
        let year = carry(&mut carried.year, row.get(columns.year));
        let week = carry(&mut carried.week, row.get(columns.week));
        let payer = carry(&mut carried.payer, row.get(columns.payer));
        let em_group = row.get(columns.em_group).and_then(Cell::label);

        let (Some(year), Some(week), Some(payer), Some(em_group)) = (year, week, payer, em_group)
        else {
            summary.skipped_missing_keys += 1;
            continue;
        };

        let record = build_record(&columns, row, year, week, payer, em_group);
        if record.passes_validation() {
            records.push(record);
        } else {
            summary.rejected_validation += 1;
        }
    }

    summary.accepted = records.len();
    tracing::info!(
        "Extracted {} billing records from {} rows ({} missing keys, {} failed validation)",
        summary.accepted,
        summary.rows_seen,
        summary.skipped_missing_keys,
        summary.rejected_validation
    );
    if summary.rejected_validation > 0 {
        tracing::warn!(
            "Dropped {} rows with negative amounts or out-of-range collection rates",
            summary.rejected_validation
        );
    }

    Ok(Extraction { records, summary })
}

fn build_record(
    columns: &ColumnMap,
    row: &[Cell],
    year: String,
    week: String,
    payer: String,
    em_group: String,
) -> BillingRecord {
    let mut record = BillingRecord {
        year,
        week,
        payer,
        em_group,
        payments_pct_of_total: 0.0,
        avg_payment: 0.0,
        avg_em_weight: 0.0,
        charge_amount: 0.0,
        collection_pct: 0.0,
        total_payments: 0.0,
        visit_count: 0.0,
        visits_with_lab_count: 0.0,
        pct_visits_with_labs: 0.0,
        payment_per_visit: 0.0,
    };
    for field in RecordField::ALL {
        if let Some(cell) = columns.index_of(field).and_then(|idx| row.get(idx)) {
            field.set(&mut record, cell.number());
        }
    }
    // These two have no positional column; derive them when the sheet omits them.
    if columns.index_of(RecordField::PaymentPerVisit).is_none() {
        record.payment_per_visit = safe_div(record.total_payments, record.visit_count);
    }
    if columns.index_of(RecordField::PctVisitsWithLabs).is_none() {
        record.pct_visits_with_labs = safe_div(record.visits_with_lab_count, record.visit_count);
    }
    record
}
