//! # Gadget Prima Terminal Library
//!
//! Bootstraps a [`PosApp`] from configuration and prints what the signed-in
//! role would see on the dashboard.
//!
//! ## Module Organization
//! ```text
//! gadget_terminal_lib/
//! ├── lib.rs   ◄─── You are here (logging, bootstrap, rendering)
//! └── main.rs  ◄─── tokio entry point
//! ```

use std::fmt::Write as _;

use chrono::{Duration, NaiveDate, Utc};
use gadget_client::{ClientConfig, PosApp};
use gadget_core::navigation::can_view;
use gadget_core::{DashboardSummary, PeriodReport, Role, Section};
use tracing::{error, info, warn};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,gadget=debug,reqwest=warn";

/// Days covered by the report printed for report-capable roles.
const REPORT_DAYS: i64 = 30;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    info!("Starting Gadget Prima POS terminal");

    let config = ClientConfig::load_or_default(None);
    info!(base_url = %config.api.base_url, "Configuration loaded");

    let app = PosApp::from_config(config).map_err(|e| {
        if e.is_config_error() {
            error!(error = %e, "Invalid configuration, check client.toml and GADGET_* variables");
        }
        e
    })?;
    let outcome = app.start().await;
    if !outcome.failed.is_empty() {
        warn!(failed = ?outcome.failed, "Some collections could not be loaded");
    }

    if !app.session().is_authenticated().await {
        if let (Ok(email), Ok(password)) = (
            std::env::var("GADGET_EMAIL"),
            std::env::var("GADGET_PASSWORD"),
        ) {
            if let Err(e) = app.login(&email, &password).await {
                eprintln!("Login failed: {}", e.user_message());
            }
        }
    }

    let identity = app.session().identity().await;
    let sections = app.visible_sections().await;
    let today = Utc::now().date_naive();

    let mut out = format!("{}\n", app.config().store_name());
    match &identity {
        Some(identity) => {
            let _ = writeln!(out, "Signed in as {} ({})", identity.name, identity.role);
        }
        None => {
            out.push_str("Not signed in. Set GADGET_EMAIL and GADGET_PASSWORD to log in.\n");
        }
    }
    out.push_str(&render_sections(&sections));

    if identity.is_some() {
        out.push_str(&render_dashboard(&app.dashboard(today)));
        let role = identity.as_ref().and_then(|i| i.role());
        if can_view(role, Section::Reports) {
            let from = today - Duration::days(REPORT_DAYS - 1);
            let report = PeriodReport::compute(&app.snapshot(), Some(from), Some(today));
            out.push_str(&render_report(&report, from, today));
        }
    }

    print!("{}", out);
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    subscriber(filter).init();
}

/// Console subscriber; `filter` alone decides what gets through.
fn subscriber(filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

// =============================================================================
// Rendering
// =============================================================================

pub fn render_sections(sections: &[Section]) -> String {
    if sections.is_empty() {
        return "Menu: (none)\n".to_string();
    }
    let labels: Vec<&str> = sections.iter().map(|s| s.menu_item().label).collect();
    format!("Menu: {}\n", labels.join(" | "))
}

pub fn render_dashboard(summary: &DashboardSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Today: {} from {} transaction(s)",
        summary.today_revenue, summary.today_transactions
    );
    let _ = writeln!(out, "Products: {}", summary.product_count);

    if !summary.low_stock.is_empty() {
        out.push_str("Low stock:\n");
        for p in &summary.low_stock {
            let _ = writeln!(out, "  {} {} ({} left, min {})", p.sku, p.name, p.stock, p.min_stock);
        }
    }

    if !summary.recent_transactions.is_empty() {
        out.push_str("Recent transactions:\n");
        for tx in &summary.recent_transactions {
            let _ = writeln!(
                out,
                "  #{} {} {} {}",
                tx.id,
                tx.date.format("%Y-%m-%d %H:%M"),
                tx.payment_method,
                tx.total
            );
        }
    }
    out
}

pub fn render_report(report: &PeriodReport, from: NaiveDate, to: NaiveDate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Report {} to {}:", from, to);
    let _ = writeln!(out, "  Revenue      {}", report.revenue);
    let _ = writeln!(out, "  Gross profit {}", report.gross_profit);
    let _ = writeln!(out, "  Expenses     {}", report.expenses);
    let _ = writeln!(out, "  Net profit   {}", report.net_profit);
    out
}

/// Exposed for callers that only have a raw role string.
pub fn menu_for(raw_role: &str) -> String {
    render_sections(&gadget_core::navigation::visible_sections(Role::parse_lenient(raw_role)))
}
