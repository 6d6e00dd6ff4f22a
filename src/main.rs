use std::time::Duration;

use chrono::{Local, Utc};
use clap::Parser;
use crossterm::event::{KeyCode, KeyModifiers};
use newsdeck::feed::ApiClient;
use newsdeck::{action, app::App, config, event, logging, ui};
use tracing::info;

/// Redraw rate; keeps "new" markers and counts current without input.
const TICK_RATE: Duration = Duration::from_millis(1000);

const LONG_HELP: &str = r#"
CONFIGURATION
    Configuration file: $XDG_CONFIG_HOME/newsdeck/config.yaml
                       (typically ~/.config/newsdeck/config.yaml)

    Log file:          $XDG_DATA_HOME/newsdeck/newsdeck.log
                       (level from NEWSDECK_LOG or RUST_LOG, default info)

    Example configuration:
        api_base_url: "http://localhost:8080/api/scraping"
        refresh_every: 300           # Auto-refresh interval (seconds)
        request_timeout: 30          # Per-request timeout (seconds)
        display:
          format:
            date: "%d/%m, %H:%M"     # Card dates (strftime)
            time: "%H:%M:%S"         # Last update stamp
          sidebar_width: 25          # Width percentage
          colours:
            active_border: "cyan"
            inactive_border: "darkgray"
            border_type: "plain"     # plain, double, thick, rounded
            highlight_bg: "darkgray"
            recent_indicator: "lightgreen"
        keybindings:
          global:
            quit: ["q", "Ctrl-c"]
            refresh: "r"
            open_browser: "o"
            cycle_source: "s"
            date_filter: "d"
            clear_filters: "c"
          sidebar:
            select: "Enter"
          cards:
            move_down: ["j", "Down"]
            move_up: ["k", "Up"]

KEYBINDINGS
    q, Ctrl+c      Quit
    Tab            Focus next pane
    Shift+Tab      Focus previous pane
    r              Reload the current view
    o              Open the selected article in the browser
    s              Cycle the source filter through the portals
    d              Filter by date (YYYY-MM-DD)
    c              Clear filters
    g / G          Jump to top / bottom
    j, k, ↑, ↓     Move
    Ctrl+d, Ctrl+u Page down / up
    Enter          Load view (sidebar), open article (cards)

VISUAL INDICATORS
    ●   Published in the last 10 minutes
"#;

/// newsdeck - a terminal dashboard for a news aggregation API
#[derive(Parser, Debug)]
#[command(name = "newsdeck")]
#[command(version)]
#[command(about = "A terminal dashboard for a news aggregation API", long_about = None)]
#[command(after_help = LONG_HELP)]
struct Args {
    /// Base URL of the news API (overrides the config file)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Seconds between automatic refreshes (overrides the config file)
    #[arg(long, value_name = "SECONDS")]
    refresh_every: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1. Configuration, with command-line overrides.
    let mut config = config::load()?;
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }
    if let Some(secs) = args.refresh_every {
        config.refresh_every = secs;
    }

    // 2. Logging to a file; the terminal belongs to the UI.
    let _log_guard = logging::init()?;
    info!(api = %config.api_base_url, refresh_every = config.refresh_every, "starting");

    // 3. Discover the portals before touching the terminal. Without them the
    //    dashboard has nothing to show.
    let client = ApiClient::new(&config.api_base_url, config.request_timeout())?;
    let portals = client.bootstrap_portals().await?;

    // 4. Application state; the first load of the `All` view starts here.
    let refresh_interval = config.refresh_interval();
    let (mut app, mut fetch_rx) = App::new(config, client, Local);
    app.bootstrap(portals);

    // 5. Terminal, input events and the refresh timer.
    let mut terminal = ratatui::init();
    let mut events = event::EventHandler::new(TICK_RATE);
    let mut refresh_timer = event::refresh_timer(refresh_interval).await;

    // 6. Main loop. All state changes happen here, one event at a time.
    let result = loop {
        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut app, Utc::now())) {
            break Err(e.into());
        }

        tokio::select! {
            event = events.next() => {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => break Err(e),
                };
                match &event {
                    event::Event::Key(key) if app.popup.is_some() => match key.code {
                        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
                            app.handle_popup_char(c);
                        }
                        KeyCode::Backspace => app.handle_popup_backspace(),
                        KeyCode::Enter => app.handle_popup_enter(),
                        KeyCode::Esc => app.handle_popup_escape(),
                        _ => {}
                    },
                    _ => {
                        if let Some(act) = action::handle_event(&event, app.active_pane, &app.config.keybindings) {
                            app.update(act);
                        }
                    }
                }
            }
            Some(result) = fetch_rx.recv() => {
                app.handle_fetch_result(result, Utc::now());
            }
            _ = refresh_timer.tick() => {
                app.refresh();
            }
        }

        if app.should_quit {
            break Ok(());
        }
    };

    // 7. Restore the terminal before reporting any error.
    ratatui::restore();
    info!("exiting");

    result
}
