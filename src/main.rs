//! Finance tracker CLI
//!
//! Terminal front end over the client stores: each subcommand builds the
//! store for its screen, runs the matching command and renders the cells.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use dotenvy::dotenv;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use finance_client::api::ApiClient;
use finance_client::config::{AppConfig, Cli, Command, ThemeAction};
use finance_client::format::{Trend, format_currency, format_month};
use finance_client::models::{Balance, DeltaMetrics, MetricsSummary};
use finance_client::reactive::{Signal, Subscription};
use finance_client::stores::{
    AddBalanceStore, BalanceListStore, ChatStore, MetricsStore, Route, SubmitOutcome,
    default_range,
};
use finance_client::telemetry;
use finance_client::theme::{FileStorage, FixedColorScheme, RootElement, ThemeStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli).context("Failed to load configuration")?;
    telemetry::init(&config.logging);

    info!(
        name: "config.loaded",
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        "configuration loaded"
    );

    let client = ApiClient::from_config(&config.api).context("Failed to build API client")?;

    let theme = ThemeStore::new(
        Arc::new(FileStorage::new(&config.theme.storage_path)),
        &FixedColorScheme(config.theme.system_prefers_dark),
        Arc::new(RootElement::default()),
    );

    match cli.command.unwrap_or(Command::Balances) {
        Command::Balances => list_balances(&client).await,
        Command::Add { date, balance } => add_balance(&client, date, balance).await,
        Command::Delete { id, yes } => delete_balance(&client, id, yes).await,
        Command::Metrics { start, end } => show_metrics(&client, start, end).await,
        Command::CurrentMonth => show_current_month(&client).await,
        Command::Chat => chat(&client).await,
        Command::Theme { action } => {
            change_theme(&theme, action.unwrap_or(ThemeAction::Show));
            Ok(())
        }
    }
}

/// Print a progress line whenever `loading` turns on.
fn progress(loading: &Signal<bool>, label: &'static str) -> Subscription {
    loading.subscribe(move |loading| {
        if *loading {
            eprintln!("{label}...");
        }
    })
}

async fn list_balances(client: &ApiClient) -> anyhow::Result<()> {
    let store = BalanceListStore::new(Arc::new(client.balances()));
    let _progress = progress(store.loading(), "Loading balances");

    if let Err(err) = store.load().await {
        bail!(
            "{}",
            store.error().get().unwrap_or_else(|| err.message.clone())
        );
    }

    if store.is_empty() {
        println!("No balances recorded yet. Add one with `finance-client add`.");
        return Ok(());
    }
    render_balances(&store.balances().get());
    Ok(())
}

fn render_balances(balances: &[Balance]) {
    println!("{:>8}  {:<16}  {:>16}", "ID", "MONTH", "BALANCE");
    for balance in balances {
        println!(
            "{:>8}  {:<16}  {:>16}",
            balance.id,
            format_month(&balance.date),
            format_currency(Some(balance.balance))
        );
    }
}

async fn add_balance(client: &ApiClient, date: String, balance: String) -> anyhow::Result<()> {
    let store = AddBalanceStore::new(Arc::new(client.balances()));
    store.set_date(date);
    store.set_balance(balance);

    match store.submit().await {
        SubmitOutcome::Created(created) => {
            println!(
                "Recorded {} for {} (id {}).",
                format_currency(Some(created.balance)),
                format_month(&created.date),
                created.id
            );
        }
        SubmitOutcome::Invalid(errors) => {
            for error in &errors {
                eprintln!("{error}");
            }
            bail!("Balance was not submitted");
        }
        SubmitOutcome::Failed(err) => {
            let banner = store.error().get().unwrap_or_default();
            bail!("{banner} ({})", err.message);
        }
        SubmitOutcome::Ignored => {}
    }

    if store.navigation().get() == Some(Route::Balances) {
        println!();
        list_balances(client).await?;
    }
    Ok(())
}

async fn delete_balance(client: &ApiClient, id: i64, yes: bool) -> anyhow::Result<()> {
    let store = BalanceListStore::new(Arc::new(client.balances()));
    store.request_delete(id);

    if !yes && !confirm(&format!("Delete balance {id}?")).await? {
        store.cancel_delete();
        println!("Cancelled.");
        return Ok(());
    }

    match store.confirm_delete(id).await {
        Ok(()) => {
            println!("Deleted balance {id}.");
            Ok(())
        }
        Err(err) => bail!("{}", err.message),
    }
}

async fn confirm(question: &str) -> anyhow::Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("{question} [y/N] ").as_bytes())
        .await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

async fn show_metrics(
    client: &ApiClient,
    start: Option<String>,
    end: Option<String>,
) -> anyhow::Result<()> {
    let store = MetricsStore::new(Arc::new(client.metrics()));
    let _progress = progress(store.loading(), "Loading metrics");

    let today = chrono::Local::now().date_naive();
    let result = if start.is_none() && end.is_none() {
        store.init(today).await
    } else {
        let (default_start, default_end) = default_range(today);
        let ((), result) = tokio::join!(
            store.load_current_month(),
            store.load_range(
                start.unwrap_or(default_start),
                end.unwrap_or(default_end)
            )
        );
        result
    };

    if let Some(current) = store.current_month().get() {
        println!(
            "This month ({}): {}  change {}",
            format_month(&current.month),
            format_currency(Some(current.balance)),
            signed(current.delta_vs_prev)
        );
        println!();
    }

    if result.is_err() {
        bail!("{}", store.error().get().unwrap_or_default());
    }

    if let Some(summary) = store.summary().get() {
        render_summary(&summary);
    }
    if let Some(delta) = store.delta().get() {
        println!();
        render_delta(&delta);
    }
    Ok(())
}

fn signed(value: Option<Decimal>) -> String {
    let text = format_currency(value);
    match Trend::of(value) {
        Trend::Positive => format!("+{text}"),
        Trend::Negative | Trend::Unknown => text,
    }
}

fn render_summary(summary: &MetricsSummary) {
    println!(
        "{} to {}",
        format_month(&summary.range.from),
        format_month(&summary.range.to)
    );
    println!("  End balance         {}", format_currency(summary.end_balance));
    println!("  Total change        {}", signed(summary.total_change));
    println!("  Last month delta    {}", signed(summary.last_month_delta));
    println!("  Start balance       {}", format_currency(summary.start_balance));
    println!("  Avg monthly change  {}", signed(summary.avg_monthly_change));
    println!(
        "  Months up / down    {} / {}",
        summary.positive_months, summary.negative_months
    );
}

fn render_delta(delta: &DeltaMetrics) {
    println!("{:<16}  {:>16}  {:>14}", "MONTH", "BALANCE", "DELTA");
    for item in &delta.items {
        println!(
            "{:<16}  {:>16}  {:>14}",
            format_month(&item.month),
            format_currency(Some(item.balance)),
            signed(item.delta)
        );
    }
    if !delta.missing_months.is_empty() {
        println!("Missing data for months: {}", delta.missing_months.join(", "));
    }
}

async fn show_current_month(client: &ApiClient) -> anyhow::Result<()> {
    let store = MetricsStore::new(Arc::new(client.metrics()));
    store.load_current_month().await;

    match store.current_month().get() {
        Some(current) => println!(
            "{}: {} (change {})",
            format_month(&current.month),
            format_currency(Some(current.balance)),
            signed(current.delta_vs_prev)
        ),
        None => println!("No data for the current month."),
    }
    Ok(())
}

async fn chat(client: &ApiClient) -> anyhow::Result<()> {
    let store = ChatStore::new(Arc::new(client.chat()));
    let _progress = progress(store.loading(), "Thinking");

    println!("Ask about your finances. /clear starts over, /exit quits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "/exit" | "/quit" => break,
            "/clear" => {
                store.clear();
                println!("Conversation cleared.");
            }
            _ => {
                store.set_draft(line);
                match store.send().await {
                    Some(Ok(reply)) => println!("{}\n", reply.content),
                    Some(Err(err)) => eprintln!("error: {}", err.message),
                    None => {}
                }
            }
        }
    }
    Ok(())
}

fn change_theme(theme: &ThemeStore, action: ThemeAction) {
    match action {
        ThemeAction::Show => {}
        ThemeAction::Toggle => {
            theme.toggle();
        }
        ThemeAction::Set { theme: value } => theme.set(value),
    }
    println!("Theme: {}", theme.theme());
}
