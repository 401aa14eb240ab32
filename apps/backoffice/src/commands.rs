//! # Backoffice Commands
//!
//! Each handler takes the database plus an output sink so the text the
//! operator sees can be checked in tests.
//!
//! ```text
//! writeoff --preview ──► InventoryRepository::preview_expired   (read only)
//! writeoff           ──► InventoryRepository::write_off_expired (one tx)
//! discounts          ──► DiscountRepository::list_active_on + resolve_discount
//! reorder            ──► ReportRepository::low_stock + expiring_within
//! report             ──► ReportRepository::kpi_summary + expiry_losses
//! ```

use std::error::Error;
use std::io::Write;

use chrono::NaiveDate;
use tracing::{info, warn};

use duka_core::{resolve_discount, Discount, DiscountType, Money, StackingOrder, WriteOffEntry};
use duka_db::Database;

pub type CommandResult = Result<(), Box<dyn Error>>;

/// Lists what a write-off on `as_of` would remove, without writing.
pub async fn writeoff_preview(db: &Database, as_of: NaiveDate, out: &mut impl Write) -> CommandResult {
    let entries = db.inventory().preview_expired(as_of).await?;

    if entries.is_empty() {
        writeln!(out, "No expired products found to write off")?;
        return Ok(());
    }

    writeln!(out, "{} expired products would be written off as of {}:", entries.len(), as_of)?;
    print_entries(&entries, out)?;

    let total: Money = entries.iter().map(WriteOffEntry::loss).sum();
    writeln!(out, "Projected loss: {}", total)?;
    Ok(())
}

/// Runs the expiry write-off as `username`.
pub async fn writeoff(
    db: &Database,
    as_of: NaiveDate,
    username: &str,
    out: &mut impl Write,
) -> CommandResult {
    let staff = db.staff().require_username(username).await.inspect_err(|e| {
        warn!(username = %username, error = %e, "Write-off staff not found");
    })?;

    let summary = db.inventory().write_off_expired(as_of, &staff.id).await?;

    if summary.is_empty() {
        writeln!(out, "No expired products found to write off")?;
        return Ok(());
    }

    print_entries(&summary.entries, out)?;
    writeln!(
        out,
        "Wrote off {} expired products. Total loss: {}",
        summary.products_written_off,
        summary.total_loss()
    )?;

    info!(
        as_of = %as_of,
        staff = %username,
        products = summary.products_written_off,
        total_loss = %summary.total_loss(),
        "Expiry write-off finished"
    );
    Ok(())
}

/// Lists discounts active on `date`; with `total`, shows how they stack.
pub async fn discounts(
    db: &Database,
    date: NaiveDate,
    total: Option<Money>,
    order: StackingOrder,
    out: &mut impl Write,
) -> CommandResult {
    let active = db.discounts().list_active_on(date).await?;

    if active.is_empty() {
        writeln!(out, "No discounts active on {}", date)?;
    } else {
        writeln!(out, "{} discounts active on {}:", active.len(), date)?;
        for discount in &active {
            writeln!(
                out,
                "  {:<30} {:<10} {:>10}  {} to {}",
                discount.name,
                discount.discount_type.as_str(),
                discount_value(discount),
                discount.start_date,
                discount.end_date
            )?;
        }
    }

    let Some(total) = total else {
        return Ok(());
    };

    let resolution = resolve_discount(total, date, &active, order);
    writeln!(out)?;
    writeln!(out, "Sale total {} with {} stacking:", total, order)?;
    for applied in &resolution.applied {
        writeln!(out, "  -{:>12}  {}", applied.amount(), applied.name)?;
    }
    writeln!(out, "Discount {}, customer pays {}", resolution.amount, resolution.apply_to(total))?;
    Ok(())
}

/// Products to reorder, then products expiring soon.
pub async fn reorder(db: &Database, as_of: NaiveDate, days: u64, out: &mut impl Write) -> CommandResult {
    let reports = db.reports();

    let low = reports.low_stock().await?;
    if low.is_empty() {
        writeln!(out, "All products are above their reorder level")?;
    } else {
        writeln!(out, "{} products at or below reorder level:", low.len())?;
        for product in &low {
            writeln!(
                out,
                "  {:<36} stock {:>5}  reorder at {:>5}",
                product.name, product.stock_quantity, product.reorder_level
            )?;
        }
    }

    let expiring = reports.expiring_within(as_of, days).await?;
    if !expiring.is_empty() {
        writeln!(out)?;
        writeln!(out, "{} products expire within {} days:", expiring.len(), days)?;
        for product in &expiring {
            let expiry = product
                .expiry_date
                .map(|d| d.to_string())
                .unwrap_or_default();
            writeln!(out, "  {:<36} stock {:>5}  expires {}", product.name, product.stock_quantity, expiry)?;
        }
    }

    Ok(())
}

/// Sales KPIs and expiry losses for `from..=to`.
pub async fn report(db: &Database, from: NaiveDate, to: NaiveDate, out: &mut impl Write) -> CommandResult {
    let reports = db.reports();

    let kpi = reports.kpi_summary(from, to).await?;
    writeln!(out, "Sales {} to {}", from, to)?;
    writeln!(out, "  Sales:          {}", kpi.sale_count)?;
    writeln!(out, "  Revenue:        {}", kpi.revenue())?;
    writeln!(out, "  Average basket: {}", kpi.average_basket())?;
    writeln!(out, "  Discounts:      {}", Money::from_cents(kpi.discounts_given_cents))?;

    let losses = reports.expiry_losses(from, to).await?;
    let total: i64 = losses.iter().map(|l| l.loss_cents).sum();
    writeln!(out, "Expiry write-offs: {} ({})", losses.len(), Money::from_cents(total))?;

    Ok(())
}

/// `10.00%`, `5,000.00` or `1:1` depending on the discount type.
fn discount_value(discount: &Discount) -> String {
    let v = discount.value_hundredths;
    match discount.discount_type {
        DiscountType::Percentage => format!("{}.{:02}%", v / 100, v % 100),
        DiscountType::Fixed => Money::from_cents(v).to_string(),
        DiscountType::Bogo if v % 100 == 0 => format!("{}:1", v / 100),
        DiscountType::Bogo => format!("{}.{:02}:1", v / 100, v % 100),
    }
}

fn print_entries(entries: &[WriteOffEntry], out: &mut impl Write) -> std::io::Result<()> {
    for entry in entries {
        writeln!(
            out,
            "  Write-off: {} (batch {}, expired {}) - {} units ({})",
            entry.product_name,
            entry.batch_number.as_deref().unwrap_or("-"),
            entry.expiry_date,
            entry.quantity,
            entry.loss()
        )?;
    }
    Ok(())
}
