//! Subcommand implementations.

use std::sync::Arc;

use anyhow::Context;
use glasscalc_calc::features;
use glasscalc_calc::{format_value, CalculationEngine, InMemoryHistory, Key};
use glasscalc_fx::{RateCacheService, RateServiceConfig};

/// Replay `keys` through a fresh engine.
pub fn calc(keys: &[String], show_history: bool) -> anyhow::Result<()> {
    let history = Arc::new(InMemoryHistory::new());
    let mut engine = CalculationEngine::new().with_history(history.clone());

    for token in keys {
        let key: Key = token
            .parse()
            .with_context(|| format!("Invalid key '{token}'"))?;
        engine.press(key);
    }

    if !engine.expression().is_empty() {
        println!("{}", engine.expression());
    }
    println!("{}", engine.display());

    if show_history {
        for entry in history.entries() {
            println!("{}", serde_json::to_string(&entry)?);
        }
    }

    Ok(())
}

pub async fn convert(
    config: &RateServiceConfig,
    amount: f64,
    from: &str,
    to: &str,
) -> anyhow::Result<()> {
    let service = RateCacheService::from_config(config)?;
    let converted = service
        .convert(amount, from, to)
        .await
        .with_context(|| format!("Failed to convert {from} to {to}"))?;

    println!(
        "{} {} = {} {}",
        format_value(amount),
        from.to_uppercase(),
        format_value(converted),
        to.to_uppercase()
    );

    if let Some(table) = service.cached(from) {
        println!("rates as of {}", table.date);
    }

    Ok(())
}

pub async fn currencies(config: &RateServiceConfig) -> anyhow::Result<()> {
    let service = RateCacheService::from_config(config)?;
    let currencies = service
        .available_currencies()
        .await
        .context("Failed to fetch currency list")?;

    for currency in currencies {
        println!(
            "{} {} {}",
            currency.flag_glyph(),
            currency.code(),
            currency.name()
        );
    }

    Ok(())
}

pub fn tip(bill: f64, percent: f64, people: u32) -> anyhow::Result<()> {
    let result = features::tip(bill, percent, people)?;

    println!("tip        {}", format_value(result.tip));
    println!("total      {}", format_value(result.total));
    if people > 1 {
        println!("per person {}", format_value(result.per_person));
    }

    Ok(())
}

pub fn discount(price: f64, percent: f64) -> anyhow::Result<()> {
    let result = features::discount(price, percent)?;

    println!("you save    {}", format_value(result.savings));
    println!("final price {}", format_value(result.final_price));

    Ok(())
}

pub fn split(total: f64, people: u32) -> anyhow::Result<()> {
    let result = features::split(total, people)?;

    println!("per person {}", format_value(result.per_person));

    Ok(())
}
