use backtraced_error::error_chain_to_pretty_formatted;
use clap::Parser;
use rca_console::client::{HttpTelemetryClient, TelemetryClient};
use rca_console::commands::{ConsoleCommand, HELP};
use rca_console::config::{Command, LaunchConfig};
use rca_console::export::export_error;
use rca_console::highlight::{share_link, Highlighter};
use rca_console::render::{render_dashboard, render_error_detail_page, render_not_found, RenderOptions};
use rca_console::scheduler::LocalClock;
use rca_console::Console;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, instrument};
use url::Url;

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // load env vars so clap can use it when parsing a config
    dotenv::dotenv().ok();
    let config = LaunchConfig::parse();
    tracing_config_helper::setup_logging(config.log_format)?;
    info!("Using config: {:#?}", config);
    let client = Arc::new(HttpTelemetryClient::new(
        config.api_url.clone(),
        config.request_timeout(),
    )?);
    match config.command {
        Command::Watch {
            page_url,
            max_cards,
        } => {
            let options = RenderOptions {
                max_cards,
                dashboard_url: config.dashboard_url,
            };
            watch(client, options, page_url).await?;
        }
        Command::Show { id } => {
            show(client.as_ref(), &id, &config.dashboard_url).await?;
        }
        Command::Export { id, out_dir } => {
            let path = export_error(client.as_ref(), &id, &out_dir).await?;
            println!("Exported error {id} to {}", path.display());
        }
        Command::Health => {
            let health = client.health().await?;
            println!(
                "{} {}",
                health.status,
                health.timestamp.unwrap_or_default()
            );
        }
        Command::TriggerCycle => {
            let triggered = client.trigger_cycle().await?;
            println!(
                "{}: {} error cards found, next boundary {}",
                triggered.message,
                triggered.error_cards_found,
                triggered.next_boundary.as_deref().unwrap_or("unknown")
            );
        }
    }
    Ok(())
}

#[instrument(skip(client, dashboard_url))]
async fn show(
    client: &HttpTelemetryClient,
    id: &str,
    dashboard_url: &Url,
) -> Result<(), rca_console::client::Error> {
    match client.error_detail(id).await {
        Ok(detail) => println!("{}", render_error_detail_page(&detail, dashboard_url)),
        Err(e) if e.is_not_found() => println!("{}", render_not_found(id, dashboard_url)),
        Err(e) => return Err(e),
    }
    Ok(())
}

fn draw(console: &Console<HttpTelemetryClient>, options: &RenderOptions) {
    let rendered = render_dashboard(&console.state().read(), options);
    println!("{CLEAR_SCREEN}{rendered}\n\n{HELP}");
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn handle_line(
    console: &Arc<Console<HttpTelemetryClient>>,
    options: &RenderOptions,
    line: &str,
) -> Flow {
    let command: ConsoleCommand = match line.parse() {
        Ok(command) => command,
        Err(e) => {
            println!("{e}\n{HELP}");
            return Flow::Continue;
        }
    };
    match command {
        ConsoleCommand::Toggle(id) => {
            let console = Arc::clone(console);
            tokio::spawn(async move {
                if let Err(e) = console.toggle(&id).await {
                    println!("{e}");
                }
            });
        }
        ConsoleCommand::View { id, sub_view } => {
            if let Err(e) = console.select_sub_view(&id, &sub_view) {
                println!("{e}");
            }
        }
        ConsoleCommand::Refresh => {
            let console = Arc::clone(console);
            tokio::spawn(async move {
                console.refresh().await;
            });
        }
        ConsoleCommand::Share(id) => {
            println!("{}", share_link(&options.dashboard_url, &id));
        }
        ConsoleCommand::Export(id) => {
            let client = Arc::clone(console.client());
            tokio::spawn(async move {
                match export_error(client.as_ref(), &id, &PathBuf::from(".")).await {
                    Ok(path) => println!("Exported error {id} to {}", path.display()),
                    Err(e) => error!(
                        "Export of {id} failed: {}",
                        error_chain_to_pretty_formatted(e)
                    ),
                }
            });
        }
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}

async fn watch(
    client: Arc<HttpTelemetryClient>,
    options: RenderOptions,
    page_url: Option<Url>,
) -> Result<(), std::io::Error> {
    let console = Arc::new(Console::new(client));
    let mut view_changes = console.subscribe_view();
    console.start(LocalClock);
    let highlighter = tokio::spawn({
        let console = Arc::clone(&console);
        let highlighter = Highlighter::from_page_url(page_url.as_ref());
        async move { console.run_highlighter(highlighter).await }
    });

    draw(&console, &options);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let result = loop {
        tokio::select! {
            changed = view_changes.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                draw(&console, &options);
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if handle_line(&console, &options, &line) == Flow::Quit {
                            break Ok(());
                        }
                    }
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e),
                }
            }
        }
    };
    highlighter.abort();
    console.teardown();
    result
}
