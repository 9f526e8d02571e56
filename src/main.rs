use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use invigil::{
    api::{ApiWorker, HttpClient},
    app::App,
    config::{Config, ConfigStore, FileConfigStore},
    paper::Paper,
    runtime::{CrosstermEventSource, ExamEvent, FixedTicker, Runner},
};

const TICK_RATE_MS: u64 = 250;

/// terminal client for timed listening/reading/writing exams
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Runs one timed exam attempt against a remote scoring backend. \
The token identifies the attempt; the endpoint is the relay that forwards to the backend."
)]
pub struct Cli {
    /// exam token handed out by the teacher
    #[clap(short = 't', long)]
    token: Option<String>,

    /// relay endpoint (overrides the config file)
    #[clap(short = 'e', long)]
    endpoint: Option<String>,

    /// exam paper to load
    #[clap(short = 'p', long)]
    paper: Option<String>,
}

impl Cli {
    /// Settles CLI flags against the persisted config.
    fn resolve(&self, cfg: &Config) -> (String, String) {
        let endpoint = self.endpoint.clone().unwrap_or_else(|| cfg.endpoint.clone());
        let paper = self.paper.clone().unwrap_or_else(|| cfg.paper.clone());
        (endpoint, paper)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let cfg = FileConfigStore::new().load();
    let (endpoint, paper_name) = cli.resolve(&cfg);

    let paper = Paper::load(&paper_name);
    let client = Arc::new(HttpClient::new(endpoint)?);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = CrosstermEventSource::new();
    let worker = ApiWorker::new(client, events.sender());
    let mut app = App::new(cli.token.clone(), paper, worker);

    let result = run(&mut terminal, &mut app, events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: CrosstermEventSource,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            ExamEvent::Tick => app.on_tick(Instant::now()),
            ExamEvent::Resize => {}
            ExamEvent::Api(reply) => app.on_api(reply, Instant::now()),
            ExamEvent::Key(key) => {
                if app.on_key(key, Instant::now()) {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["invigil"]);

        assert_eq!(cli.token, None);
        assert_eq!(cli.endpoint, None);
        assert_eq!(cli.paper, None);
    }

    #[test]
    fn test_cli_token_flag() {
        let cli = Cli::parse_from(["invigil", "-t", "abc123"]);
        assert_eq!(cli.token.as_deref(), Some("abc123"));

        let cli = Cli::parse_from(["invigil", "--token", "xyz"]);
        assert_eq!(cli.token.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_cli_endpoint_overrides_config() {
        let cli = Cli::parse_from(["invigil", "-e", "http://relay.test/"]);
        let cfg = Config::default();
        let (endpoint, paper) = cli.resolve(&cfg);

        assert_eq!(endpoint, "http://relay.test/");
        assert_eq!(paper, cfg.paper);
    }

    #[test]
    fn test_cli_falls_back_to_config() {
        let cli = Cli::parse_from(["invigil"]);
        let cfg = Config {
            endpoint: "https://relay.example.org/api".into(),
            paper: "summer-2026".into(),
        };
        let (endpoint, paper) = cli.resolve(&cfg);

        assert_eq!(endpoint, "https://relay.example.org/api");
        assert_eq!(paper, "summer-2026");
    }

    #[test]
    fn test_cli_paper_flag() {
        let cli = Cli::parse_from(["invigil", "--paper", "mock-a"]);
        let (_, paper) = cli.resolve(&Config::default());
        assert_eq!(paper, "mock-a");
    }

    #[test]
    fn test_tick_rate_constant() {
        const _: () = assert!(TICK_RATE_MS > 0);
        const _: () = assert!(TICK_RATE_MS <= 1000); // Should be sub-second
    }
}
