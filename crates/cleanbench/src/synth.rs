//! Seeded synthetic raw tables.
//!
//! The generators produce the kind of input the built-in cleaners expect:
//! raw-style column labels, formatted numbers, stray text in numeric cells,
//! mixed-case encodings, and blank cells. The same `(rows, seed)` always
//! yields the same table.

use crate::datasets::{CONTRACT_TYPES, PRODUCT_CATEGORIES};
use crate::error::Result;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const MISSING_RATE: f64 = 0.04;
const GARBAGE_RATE: f64 = 0.02;

const YES_NO: [&str; 6] = ["Yes", "No", "yes", "no", "Y", "N"];
const GARBAGE: [&str; 4] = ["abc", "???", "#REF!", "tbd"];
const BLANKS: [&str; 4] = ["", " ", "N/A", "null"];

/// Accumulates one raw text column.
struct RawColumn {
    name: &'static str,
    values: Vec<Option<String>>,
}

impl RawColumn {
    fn new(name: &'static str, rows: usize) -> Self {
        Self {
            name,
            values: Vec::with_capacity(rows),
        }
    }

    /// Push `value`, occasionally replaced by a blank or a garbage token.
    fn push_dirty(&mut self, rng: &mut StdRng, value: String) {
        let roll: f64 = rng.r#gen();
        let cell = if roll < MISSING_RATE {
            pick(rng, &BLANKS).map(str::to_string)
        } else if roll < MISSING_RATE + GARBAGE_RATE {
            pick(rng, &GARBAGE).map(str::to_string)
        } else {
            Some(value)
        };
        self.values.push(cell);
    }

    fn push(&mut self, value: String) {
        self.values.push(Some(value));
    }

    fn into_column(self) -> Column {
        Series::new(self.name.into(), self.values).into_column()
    }
}

fn pick<'a>(rng: &mut StdRng, options: &[&'a str]) -> Option<&'a str> {
    options.choose(rng).copied()
}

fn random_case(rng: &mut StdRng, value: &str) -> String {
    match rng.gen_range(0..3) {
        0 => value.to_uppercase(),
        1 => format!(" {value} "),
        _ => value.to_string(),
    }
}

fn money(rng: &mut StdRng, value: f64) -> String {
    if rng.gen_bool(0.3) {
        format!("${value:.2}")
    } else {
        format!("{value:.2}")
    }
}

/// Raw e-commerce transactions.
///
/// Columns: `Order ID`, `Unit Price`, `Qty`, `Category`, `Returned`,
/// `Customer Name`. About one in twenty prices is non-positive or
/// unparseable.
pub fn ecommerce(rows: usize, seed: u64) -> Result<DataFrame> {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut order_id = RawColumn::new("Order ID", rows);
    let mut price = RawColumn::new("Unit Price", rows);
    let mut qty = RawColumn::new("Qty", rows);
    let mut category = RawColumn::new("Category", rows);
    let mut returned = RawColumn::new("Returned", rows);
    let mut customer = RawColumn::new("Customer Name", rows);

    for i in 0..rows {
        order_id.push(format!("ORD-{:06}", i + 1));

        let amount = if rng.gen_bool(0.01) {
            -rng.gen_range(1.0..50.0)
        } else {
            rng.gen_range(1.0..2500.0)
        };
        let amount = money(&mut rng, amount);
        price.push_dirty(&mut rng, amount);

        let units = rng.gen_range(1..6).to_string();
        qty.push_dirty(&mut rng, units);

        let label = if rng.gen_bool(0.03) {
            "garden".to_string()
        } else {
            let label = pick(&mut rng, &PRODUCT_CATEGORIES).unwrap_or("books");
            random_case(&mut rng, label)
        };
        category.push_dirty(&mut rng, label);

        let flag = pick(&mut rng, &["Yes", "No", "no", "0", "1", "False"]).unwrap_or("No");
        returned.push_dirty(&mut rng, flag.to_string());

        customer.push(format!("Customer {}", rng.gen_range(1..=rows.max(1))));
    }

    let columns = vec![
        order_id.into_column(),
        price.into_column(),
        qty.into_column(),
        category.into_column(),
        returned.into_column(),
        customer.into_column(),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Raw telco customer records, labelled like the public churn dataset.
///
/// New customers (tenure 0) carry a blank `TotalCharges`, so some rows are
/// always dropped.
pub fn telco_churn(rows: usize, seed: u64) -> Result<DataFrame> {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut customer_id = RawColumn::new("customerID", rows);
    let mut gender = RawColumn::new("gender", rows);
    let mut senior = RawColumn::new("SeniorCitizen", rows);
    let mut partner = RawColumn::new("Partner", rows);
    let mut dependents = RawColumn::new("Dependents", rows);
    let mut tenure = RawColumn::new("tenure", rows);
    let mut phone = RawColumn::new("PhoneService", rows);
    let mut multiple_lines = RawColumn::new("MultipleLines", rows);
    let mut internet = RawColumn::new("InternetService", rows);
    let mut addon_columns = [
        RawColumn::new("OnlineSecurity", rows),
        RawColumn::new("OnlineBackup", rows),
        RawColumn::new("DeviceProtection", rows),
        RawColumn::new("TechSupport", rows),
        RawColumn::new("StreamingTV", rows),
        RawColumn::new("StreamingMovies", rows),
    ];
    let mut contract = RawColumn::new("Contract", rows);
    let mut paperless = RawColumn::new("PaperlessBilling", rows);
    let mut monthly = RawColumn::new("MonthlyCharges", rows);
    let mut total = RawColumn::new("TotalCharges", rows);
    let mut churn = RawColumn::new("Churn", rows);

    for i in 0..rows {
        customer_id.push(format!("{:04}-CUST", i + 1));
        gender.push(pick(&mut rng, &["Male", "Female"]).unwrap_or("Female").to_string());

        let is_senior = if rng.gen_bool(0.16) { "1" } else { "0" };
        senior.push_dirty(&mut rng, is_senior.to_string());
        for column in [&mut partner, &mut dependents, &mut paperless] {
            let answer = pick(&mut rng, &YES_NO).unwrap_or("No");
            column.push_dirty(&mut rng, answer.to_string());
        }

        let months: u32 = if rng.gen_bool(0.02) { 0 } else { rng.gen_range(1..=72) };
        tenure.push_dirty(&mut rng, months.to_string());

        let has_phone = rng.gen_bool(0.9);
        phone.push_dirty(&mut rng, if has_phone { "Yes" } else { "No" }.to_string());
        let lines = if has_phone {
            pick(&mut rng, &["Yes", "No"]).unwrap_or("No")
        } else {
            "No phone service"
        };
        multiple_lines.push_dirty(&mut rng, lines.to_string());

        let service = pick(&mut rng, &["DSL", "Fiber optic", "No"]).unwrap_or("No");
        internet.push(service.to_string());
        for column in addon_columns.iter_mut() {
            let answer = if service == "No" {
                "No internet service"
            } else {
                pick(&mut rng, &["Yes", "No"]).unwrap_or("No")
            };
            column.push_dirty(&mut rng, answer.to_string());
        }

        let term = pick(&mut rng, &CONTRACT_TYPES).unwrap_or("month-to-month");
        let term = random_case(&mut rng, term);
        contract.push_dirty(&mut rng, term);

        let charge = rng.gen_range(18.0..120.0);
        monthly.push_dirty(&mut rng, format!("{charge:.2}"));

        if months == 0 {
            total.push(" ".to_string());
        } else {
            let lifetime = charge * f64::from(months) * rng.gen_range(0.9..1.1);
            total.push_dirty(&mut rng, format!("{lifetime:.2}"));
        }

        let churned = pick(&mut rng, &["Yes", "No", "No", "No"]).unwrap_or("No");
        churn.push_dirty(&mut rng, churned.to_string());
    }

    let mut columns = vec![
        customer_id.into_column(),
        gender.into_column(),
        senior.into_column(),
        partner.into_column(),
        dependents.into_column(),
        tenure.into_column(),
        phone.into_column(),
        multiple_lines.into_column(),
        internet.into_column(),
    ];
    columns.extend(addon_columns.into_iter().map(RawColumn::into_column));
    columns.extend([
        contract.into_column(),
        paperless.into_column(),
        monthly.into_column(),
        total.into_column(),
        churn.into_column(),
    ]);
    Ok(DataFrame::new(columns)?)
}
