//! Reporting — Markdown-style text reports and CSV exports.
//!
//! Text reports go to stdout from the CLI. CSV exports carry the same rows
//! for spreadsheets and external analysis tools.

use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::backtest::{BacktestResult, TradeRow};
use crate::compare::{Comparison, StrategyRow, StrategyStats};
use crate::live::RunReport;

// ─── Backtest ───────────────────────────────────────────────────────

/// Full backtest report: trade ledger, totals, pending and active signals,
/// open positions.
pub fn render_backtest(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(4096);
    md.push_str("# Backtest Report\n\n");

    let rows = result.trade_rows();
    md.push_str("## Trades\n\n");
    if rows.is_empty() {
        md.push_str("No closed trades.\n\n");
    } else {
        md.push_str("| Ticker | Lot | Buy Date | Sell Date | Buy | Sell | Quantity | Cost | Proceeds | P/L | P/L % |\n");
        md.push_str("| --- | --- | --- | --- | ---: | ---: | ---: | ---: | ---: | ---: | ---: |\n");
        for row in &rows {
            md.push_str(&format!(
                "| {} | {} | {} | {} | ${:.2} | ${:.2} | {:.4} | ${:.2} | ${:.2} | ${:.2} | {:.2}% |\n",
                row.ticker,
                row.lot,
                row.buy_date,
                row.sell_date,
                row.buy_price,
                row.sell_price,
                row.quantity,
                row.cost,
                row.proceeds,
                row.profit_loss,
                row.profit_loss_pct,
            ));
        }
        md.push('\n');

        let invested: Decimal = rows.iter().map(|r| r.cost).sum();
        let proceeds: Decimal = rows.iter().map(|r| r.proceeds).sum();
        let pl = proceeds - invested;
        md.push_str("## Totals\n\n");
        md.push_str(&format!("- Total Investment: ${invested:.2}\n"));
        md.push_str(&format!("- Total Proceeds: ${proceeds:.2}\n"));
        md.push_str(&format!("- Total P/L: ${pl:.2}\n"));
        if !invested.is_zero() {
            md.push_str(&format!("- Total P/L %: {:.2}%\n", pl / invested * Decimal::ONE_HUNDRED));
        }
        md.push('\n');
    }

    md.push_str("## P/L Summary\n\n");
    md.push_str(&format!("- Total Deposits: ${:.2}\n", result.total_deposits));
    md.push_str(&format!("- Final Account Value: ${:.2}\n", result.final_account_value()));
    md.push_str(&format!("- Cash: ${:.2}\n", result.ledger.cash));
    md.push_str(&format!(
        "- P/L: ${:.2} ({:.2}%)\n",
        result.profit_loss(),
        result.profit_loss_pct()
    ));
    md.push_str(&format!(
        "- Ticks: {} | Signal errors: {} | Missing quotes: {}\n\n",
        result.ticks, result.error_count, result.missing_quote_count
    ));

    let pending: Vec<_> = result.pending().collect();
    if !pending.is_empty() {
        md.push_str("## Pending Signals\n\n");
        md.push_str("| Ticker | Buy Date | Sell Date | Weight |\n");
        md.push_str("| --- | --- | --- | ---: |\n");
        for s in pending {
            md.push_str(&format!(
                "| {} | {} | {} | {}% |\n",
                s.ticker, s.buy_date, s.sell_date, s.allocation_weight
            ));
        }
        md.push('\n');
    }

    let active: Vec<_> = result.active().collect();
    if !active.is_empty() {
        md.push_str("## Active Signals\n\n");
        md.push_str("| Ticker | Buy Date | Sell Date | Lots | Quantity | Cost | High |\n");
        md.push_str("| --- | --- | --- | ---: | ---: | ---: | ---: |\n");
        for s in active {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {:.4} | ${:.2} | ${:.2} |\n",
                s.ticker,
                s.buy_date,
                s.sell_date,
                s.trades().count(),
                s.total_quantity(),
                s.total_cost(),
                s.high_price,
            ));
        }
        md.push('\n');
    }

    if !result.ledger.positions.is_empty() {
        md.push_str("## Open Positions\n\n");
        md.push_str("| Ticker | Shares | Avg Price | Cost Basis |\n");
        md.push_str("| --- | ---: | ---: | ---: |\n");
        for (ticker, position) in &result.ledger.positions {
            md.push_str(&format!(
                "| {} | {:.4} | ${:.2} | ${:.2} |\n",
                ticker,
                position.shares,
                position.avg_buy_price,
                position.cost_basis()
            ));
        }
        md.push('\n');
    }

    md
}

// ─── Comparison ─────────────────────────────────────────────────────

/// Per-signal strategy rows followed by the summary tables.
pub fn render_comparison(comparison: &Comparison) -> String {
    let mut md = String::with_capacity(4096);
    md.push_str("# Strategy Comparison\n\n");

    if comparison.rows.is_empty() {
        md.push_str("No signals could be evaluated.\n\n");
    } else {
        md.push_str("| Ticker | Strategy | Buy Date | Sell Date | Entry | Exit | P/L | P/L % | Days | Max Gain | Max DD | Entry Note | Exit Note |\n");
        md.push_str("| --- | --- | --- | --- | ---: | ---: | ---: | ---: | ---: | ---: | ---: | --- | --- |\n");
        for row in &comparison.rows {
            md.push_str(&format!(
                "| {} | {} | {} | {} | ${:.2} | ${:.2} | ${:+.2} | {:+.2}% | {} | {:.2}% | {:.2}% | {} | {} |\n",
                row.ticker,
                row.strategy,
                row.buy_date,
                row.sell_date,
                row.entry_price,
                row.exit_price,
                row.profit_loss,
                row.profit_loss_pct,
                row.days_held,
                row.max_gain_pct,
                row.max_drawdown_pct,
                row.entry_description,
                row.exit_description,
            ));
        }
        md.push('\n');
    }

    let summary = comparison.summary();
    md.push_str("## Summary\n\n");
    md.push_str("| Strategy | Trades | Wins | Losses | Win Rate | Avg Return | Avg Hold | Annualized | Total Return |\n");
    md.push_str("| --- | ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: |\n");
    for (kind, stats) in &summary.per_strategy {
        push_stats_row(&mut md, kind.label(), stats);
    }
    push_stats_row(&mut md, "All strategies", &summary.overall);
    md.push('\n');

    if let Some(best) = &summary.best {
        md.push_str(&format!("- Best: {}\n", describe(best)));
    }
    if let Some(worst) = &summary.worst {
        md.push_str(&format!("- Worst: {}\n", describe(worst)));
    }
    md.push_str(&format!(
        "- Max concurrent signals: {}\n",
        summary.max_concurrent_signals
    ));

    if !comparison.skipped.is_empty() {
        md.push_str("\n## Skipped Signals\n\n");
        for (id, reason) in &comparison.skipped {
            md.push_str(&format!("- {id}: {reason}\n"));
        }
    }

    md
}

fn push_stats_row(md: &mut String, label: &str, stats: &StrategyStats) {
    md.push_str(&format!(
        "| {} | {} | {} | {} | {:.1}% | {:+.2}% | {:.1}d | {:+.2}% | {:+.2}% |\n",
        label,
        stats.trades,
        stats.wins,
        stats.losses,
        stats.win_rate_pct,
        stats.avg_return_pct,
        stats.avg_hold_days,
        stats.annualized_return_pct,
        stats.total_return_pct,
    ));
}

fn describe(row: &StrategyRow) -> String {
    format!(
        "{} {} ({} to {}) {:+.2}%",
        row.ticker, row.strategy, row.buy_date, row.sell_date, row.profit_loss_pct
    )
}

// ─── Live run ───────────────────────────────────────────────────────

pub fn render_run_report(report: &RunReport) -> String {
    let mut md = String::with_capacity(512);
    md.push_str(&format!("# Trading Run {}\n\n", report.date));
    md.push_str(&format!("- Processed: {}\n", report.processed));
    md.push_str(&format!("- Errors: {}\n", report.errors));
    md.push_str(&format!(
        "- Bought: {} | Dip buys: {} | Completed: {} | Waiting on quotes: {}\n",
        report.entered, report.dip_buys, report.exited, report.missing_quotes
    ));
    md.push_str(&format!("- Account Value: {}\n", dollars(report.account_value)));
    md.push_str(&format!("- Cash: {}\n", dollars(report.cash)));
    md.push_str(&format!("- Open Signals: {}\n", report.remaining_signals));
    if let Some(window) = &report.window {
        md.push_str(&format!(
            "- Allocation Window: {} to {}, ${:.2} per signal\n",
            window.window_start, window.window_end, window.allocation_per_signal
        ));
    }
    md
}

fn dollars(amount: Option<Decimal>) -> String {
    amount.map_or_else(|| "unavailable".to_string(), |a| format!("${a:.2}"))
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the backtest trade ledger as CSV.
pub fn export_trades_csv(rows: &[TradeRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "ticker",
        "lot",
        "buy_date",
        "sell_date",
        "buy_price",
        "sell_price",
        "quantity",
        "cost",
        "proceeds",
        "profit_loss",
        "profit_loss_pct",
    ])?;
    for row in rows {
        wtr.write_record([
            &row.ticker,
            &row.lot,
            &row.buy_date.to_string(),
            &row.sell_date.to_string(),
            &row.buy_price.to_string(),
            &row.sell_price.to_string(),
            &row.quantity.to_string(),
            &format!("{:.2}", row.cost),
            &format!("{:.2}", row.proceeds),
            &format!("{:.2}", row.profit_loss),
            &format!("{:.2}", row.profit_loss_pct),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export strategy comparison rows as CSV.
pub fn export_comparison_csv(rows: &[StrategyRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "signal_id",
        "ticker",
        "strategy",
        "buy_date",
        "sell_date",
        "entry_price",
        "exit_price",
        "profit_loss",
        "profit_loss_pct",
        "days_held",
        "is_win",
        "entry_description",
        "exit_description",
        "max_gain_pct",
        "max_drawdown_pct",
    ])?;
    for row in rows {
        wtr.write_record([
            row.signal_id.to_string(),
            row.ticker.clone(),
            row.strategy.label().to_string(),
            row.buy_date.to_string(),
            row.sell_date.to_string(),
            format!("{:.4}", row.entry_price),
            format!("{:.4}", row.exit_price),
            format!("{:.4}", row.profit_loss),
            format!("{:.2}", row.profit_loss_pct),
            row.days_held.to_string(),
            row.is_win.to_string(),
            row.entry_description.clone(),
            row.exit_description.clone(),
            format!("{:.2}", row.max_gain_pct),
            format!("{:.2}", row.max_drawdown_pct),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}
