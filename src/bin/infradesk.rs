use anyhow::Result;
use clap::{CommandFactory, Parser};
use infradesk::api::logging::init_logging;
use infradesk::config::Config;
use infradesk::state::ExchangeSnapshot;
use infradesk::types::{ApprovalDecision, Role};
use infradesk::{Exchange, ExchangeError, SessionOutcome};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;

const APPROVAL_PROMPT: &str = "Authorization required: execute runbook? [y/N] ";

#[derive(Parser, Debug)]
#[command(
    name = "infradesk",
    about = "Chat with the infrastructure troubleshooting agents"
)]
struct Cli {
    /// Agent backend base URL (overrides INFRADESK_API_URL).
    #[arg(long)]
    url: Option<String>,
    /// Reuse an existing backend thread.
    #[arg(long)]
    thread_id: Option<String>,
    /// Read messages from stdin until `exit` or `quit`.
    #[arg(short, long)]
    interactive: bool,
    /// Single query to send.
    query: Vec<String>,
}

enum Turn {
    Send(String),
    Refresh,
    Resume(ApprovalDecision),
}

/// Prints what changed between successive snapshots.
#[derive(Default)]
struct Transcript {
    printed_messages: usize,
    printed_tool_calls: Vec<usize>,
}

impl Transcript {
    fn start_turn(&mut self) {
        self.printed_tool_calls.clear();
    }

    fn render(&mut self, snapshot: &ExchangeSnapshot) {
        for (index, step) in snapshot.steps.iter().enumerate() {
            if index >= self.printed_tool_calls.len() {
                println!("  > {}", step.agent);
                self.printed_tool_calls.push(0);
            }
            for call in step.tool_calls.iter().skip(self.printed_tool_calls[index]) {
                println!("    - {}({})", call.tool, call.args);
            }
            self.printed_tool_calls[index] = step.tool_calls.len();
        }

        for message in snapshot.messages.iter().skip(self.printed_messages) {
            if message.role != Role::Assistant {
                continue;
            }
            match &message.agent {
                Some(agent) => println!("[{agent}]: {}", message.content),
                None => println!("{}", message.content),
            }
        }
        self.printed_messages = snapshot.messages.len();
    }
}

struct Console {
    exchange: Exchange,
    snapshots: watch::Receiver<ExchangeSnapshot>,
    transcript: Transcript,
    stdin: Lines<BufReader<Stdin>>,
}

impl Console {
    fn new(exchange: Exchange) -> Self {
        let snapshots = exchange.subscribe();
        Self {
            exchange,
            snapshots,
            transcript: Transcript::default(),
            stdin: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        Ok(self.stdin.next_line().await?)
    }

    /// Runs one turn, plus any approval round-trips it triggers.
    async fn converse(&mut self, turn: Turn) -> Result<()> {
        let mut turn = turn;
        loop {
            match self.run_turn(turn).await {
                Ok(SessionOutcome::AwaitingApproval) => {
                    let answer = self.read_line(APPROVAL_PROMPT).await?.unwrap_or_default();
                    let decision = match answer.trim().to_ascii_lowercase().as_str() {
                        "y" | "yes" | "approve" => ApprovalDecision::Approve,
                        _ => ApprovalDecision::Deny,
                    };
                    turn = Turn::Resume(decision);
                }
                Ok(SessionOutcome::Completed) => return Ok(()),
                Ok(SessionOutcome::Closed) => {
                    eprintln!("warning: the agent backend closed the stream early");
                    return Ok(());
                }
                Err(error) => {
                    eprintln!("error: {error}");
                    return Ok(());
                }
            }
        }
    }

    async fn run_turn(&mut self, turn: Turn) -> Result<SessionOutcome, ExchangeError> {
        if !matches!(turn, Turn::Resume(_)) {
            self.transcript.start_turn();
        }

        let exchange = &mut self.exchange;
        let snapshots = &mut self.snapshots;
        let transcript = &mut self.transcript;

        let session = async move {
            match turn {
                Turn::Send(text) => exchange.send(&text).await,
                Turn::Refresh => exchange.refresh().await,
                Turn::Resume(decision) => exchange.resume(decision).await,
            }
        };
        tokio::pin!(session);

        loop {
            tokio::select! {
                result = &mut session => {
                    transcript.render(&snapshots.borrow_and_update());
                    return result;
                }
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        return session.await;
                    }
                    transcript.render(&snapshots.borrow_and_update());
                }
            }
        }
    }

    async fn interactive(&mut self) -> Result<()> {
        println!("infradesk (thread {})", self.exchange.thread_id());
        println!("Type 'exit' or 'quit' to stop, '/refresh' to scan infrastructure.\n");

        while let Some(line) = self.read_line("User: ").await? {
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                break;
            }
            let turn = if input == "/refresh" {
                Turn::Refresh
            } else {
                Turn::Send(input.to_string())
            };
            self.converse(turn).await?;
            println!();
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.url {
        config.api_url = url;
    }
    if let Some(thread_id) = cli.thread_id {
        config.thread_id = Some(thread_id);
    }
    config.validate()?;

    if !cli.interactive && cli.query.is_empty() {
        Cli::command().print_help()?;
        return Ok(());
    }

    let mut console = Console::new(Exchange::from_config(&config)?);
    if cli.interactive {
        console.interactive().await
    } else {
        let query = cli.query.join(" ");
        println!("Executing: {query}");
        console.converse(Turn::Send(query)).await
    }
}
