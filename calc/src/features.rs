//! Tip, discount and bill-split calculators.

use serde::{Deserialize, Serialize};

use crate::error::{CalcError, CalcResult};
use crate::format::format_value;
use crate::history::{Category, HistoryEntry};

/// Result of a tip calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipBreakdown {
    pub bill: f64,
    pub percent: f64,
    pub people: u32,
    pub tip: f64,
    pub total: f64,
    pub per_person: f64,
}

impl TipBreakdown {
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry::new(
            format_value(self.total),
            format!(
                "{} + {}% tip ÷ {}",
                format_value(self.bill),
                format_value(self.percent),
                self.people
            ),
            Category::Tip,
        )
    }
}

/// Result of a discount calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountBreakdown {
    pub price: f64,
    pub percent: f64,
    pub savings: f64,
    pub final_price: f64,
}

impl DiscountBreakdown {
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry::new(
            format_value(self.final_price),
            format!("{} − {}%", format_value(self.price), format_value(self.percent)),
            Category::Discount,
        )
    }
}

/// Result of splitting a bill evenly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitBreakdown {
    pub total: f64,
    pub people: u32,
    pub per_person: f64,
}

impl SplitBreakdown {
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry::new(
            format_value(self.per_person),
            format!("{} ÷ {}", format_value(self.total), self.people),
            Category::Split,
        )
    }
}

/// Tip on `bill` at `percent`, shared between `people`.
pub fn tip(bill: f64, percent: f64, people: u32) -> CalcResult<TipBreakdown> {
    ensure_amount("bill", bill)?;
    ensure_amount("tip percent", percent)?;
    ensure_people(people)?;

    let tip = bill * percent / 100.0;
    let total = bill + tip;
    Ok(TipBreakdown {
        bill,
        percent,
        people,
        tip,
        total,
        per_person: total / f64::from(people),
    })
}

/// `percent` off `price`. The percentage must be within 0..=100.
pub fn discount(price: f64, percent: f64) -> CalcResult<DiscountBreakdown> {
    ensure_amount("price", price)?;
    ensure_amount("discount percent", percent)?;
    if percent > 100.0 {
        return Err(CalcError::InvalidInput(format!(
            "discount percent {percent} exceeds 100"
        )));
    }

    let savings = price * percent / 100.0;
    Ok(DiscountBreakdown {
        price,
        percent,
        savings,
        final_price: price - savings,
    })
}

/// Split `total` evenly between `people`.
pub fn split(total: f64, people: u32) -> CalcResult<SplitBreakdown> {
    ensure_amount("total", total)?;
    ensure_people(people)?;

    Ok(SplitBreakdown {
        total,
        people,
        per_person: total / f64::from(people),
    })
}

fn ensure_amount(field: &str, value: f64) -> CalcResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CalcError::InvalidInput(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

fn ensure_people(people: u32) -> CalcResult<()> {
    if people == 0 {
        return Err(CalcError::InvalidInput("people must be at least 1".to_string()));
    }
    Ok(())
}
