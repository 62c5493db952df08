use crate::utils::error::{Result, ToolkitError};
use crate::utils::format::round_money;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

pub const STANDARD_DEDUCTION: Decimal = dec!(50_000);
pub const MAX_INVESTMENT_DEDUCTION: Decimal = dec!(150_000);
pub const MAX_HEALTH_INSURANCE_DEDUCTION: Decimal = dec!(25_000);
const REBATE_LIMIT: Decimal = dec!(500_000);

/// Hourly earnings the productivity figure is measured against.
pub const BENCHMARK_HOURLY_RATE: Decimal = dec!(5411);
const DAYS_PER_MONTH: Decimal = dec!(30);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxReport {
    pub taxable_income: Decimal,
    pub total_deductions: Decimal,
    pub tax: Decimal,
    pub rebate_applied: bool,
    pub rebate_text: String,
}

/// Slab tax: 0% up to 2.5L, 5% to 5L, 20% to 10L, 30% above. Nothing is due up to 5L (87A).
pub fn calculate_tax(income: Decimal, investment: Decimal, health_insurance: Decimal) -> TaxReport {
    let investment = investment.clamp(Decimal::ZERO, MAX_INVESTMENT_DEDUCTION);
    let health_insurance = health_insurance.clamp(Decimal::ZERO, MAX_HEALTH_INSURANCE_DEDUCTION);
    let total_deductions = STANDARD_DEDUCTION + investment + health_insurance;
    let taxable_income = income.saturating_sub(total_deductions).max(Decimal::ZERO);

    let slab_tax = if taxable_income <= dec!(250_000) {
        Decimal::ZERO
    } else if taxable_income <= dec!(500_000) {
        (taxable_income - dec!(250_000)) * dec!(0.05)
    } else if taxable_income <= dec!(1_000_000) {
        dec!(12_500) + (taxable_income - dec!(500_000)) * dec!(0.20)
    } else {
        dec!(112_500) + (taxable_income - dec!(1_000_000)) * dec!(0.30)
    };

    let rebate_applied = taxable_income <= REBATE_LIMIT;
    let tax = if rebate_applied { Decimal::ZERO } else { slab_tax };

    TaxReport {
        taxable_income,
        total_deductions,
        tax: round_money(tax),
        rebate_applied,
        rebate_text: if rebate_applied {
            "Rebate under section 87A applied.".to_string()
        } else {
            "No rebate available.".to_string()
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Below,
    At,
    Above,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Below => "below",
            Comparison::At => "at",
            Comparison::Above => "above",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductivityReport {
    /// Hourly rate as a percentage of the benchmark, two decimals.
    pub productivity: Decimal,
    pub daily_rate: Decimal,
    pub hourly_rate: Decimal,
    pub comparison: Comparison,
}

pub fn calculate_productivity(hours_per_day: Decimal, monthly_profit: Decimal) -> Result<ProductivityReport> {
    if hours_per_day <= Decimal::ZERO {
        return Err(ToolkitError::validation(
            "Hours worked per day must be greater than 0.",
        ));
    }

    let daily_rate = monthly_profit / DAYS_PER_MONTH;
    let hourly_rate = daily_rate
        .checked_div(hours_per_day)
        .ok_or_else(|| ToolkitError::validation("Hourly earnings are out of range."))?;
    let comparison = match hourly_rate.cmp(&BENCHMARK_HOURLY_RATE) {
        std::cmp::Ordering::Less => Comparison::Below,
        std::cmp::Ordering::Equal => Comparison::At,
        std::cmp::Ordering::Greater => Comparison::Above,
    };
    let productivity = (hourly_rate / BENCHMARK_HOURLY_RATE)
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| ToolkitError::validation("Hourly earnings are out of range."))?;

    Ok(ProductivityReport {
        productivity: round_money(productivity),
        daily_rate: round_money(daily_rate),
        hourly_rate: round_money(hourly_rate),
        comparison,
    })
}
