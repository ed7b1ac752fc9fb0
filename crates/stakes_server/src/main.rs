//! Stakes - wagered tic-tac-toe service and terminal client.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use cli::{Cli, Command};
use stakes_server::client::{
    GameApi, GameListing, HttpClient, PendingMove, PlayView, Session, SessionError, Submission,
    card_summary,
};
use stakes_server::{GameService, ServerConfig, api::CallResult, server};
use stakes_tictactoe::{Address, CELLS, Game, GameError, Move, stake};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

/// Environment variable naming the acting address.
const CALLER_ENV: &str = "STAKES_CALLER";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,stakes_server=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(&cli.config)?;
    let caller = cli
        .caller
        .clone()
        .or_else(|| std::env::var(CALLER_ENV).ok())
        .map(Address::new);

    let connect = || HttpClient::new(&cli.server_url, config.request_timeout());
    match cli.command {
        Command::Serve { database, faucet } => run_serve(config.clone(), database, faucet).await,
        Command::Create { bet, cell } => {
            let session = Session::new(connect()?, require(caller)?);
            run_create(&session, &bet, cell).await
        }
        Command::Join { game_id, cell } => {
            let session = Session::new(connect()?, require(caller)?);
            run_move(&session, game_id, cell, true).await
        }
        Command::Play { game_id, cell } => {
            let session = Session::new(connect()?, require(caller)?);
            run_move(&session, game_id, cell, false).await
        }
        Command::Show { game_id } => run_show(&connect()?, game_id, caller.as_ref()).await,
        Command::List => run_list(&connect()?, caller.as_ref()).await,
        Command::Balance { address } => {
            let address = address
                .map(Address::new)
                .or(caller)
                .ok_or_else(|| anyhow!("No address given and no caller set"))?;
            let balance = connect()?.balance(&address).await?;
            println!("{}: {} STX", address, stake::format_display(balance));
            Ok(())
        }
        Command::Fund { address, amount } => {
            let address = Address::new(address);
            let amount = stake::parse_display(&amount)?;
            match connect()?.fund(&address, amount).await? {
                CallResult::Ok(balance) => {
                    println!("{}: {} STX", address, stake::format_display(balance));
                    Ok(())
                }
                CallResult::Err(code) => bail!("Fund rejected with code {}", code),
            }
        }
    }
}

fn require(caller: Option<Address>) -> Result<Address> {
    caller.ok_or_else(|| anyhow!("No caller set; pass --caller or set {}", CALLER_ENV))
}

/// Board cells are shown 1-9; anything else maps off the board.
fn cell_index(cell: usize) -> usize {
    cell.checked_sub(1).unwrap_or(CELLS)
}

/// Run the HTTP game service
#[instrument(skip(config))]
async fn run_serve(config: ServerConfig, database: Option<String>, faucet: bool) -> Result<()> {
    let mut config = config;
    if let Some(database) = database {
        config = config.with_database(database);
    }
    if faucet {
        config = config.with_faucet(true);
    }

    let service = GameService::from_config(&config).await?;
    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    info!(address = %config.bind_address(), faucet = service.faucet(), "Server ready");
    server::serve(listener, service).await?;
    Ok(())
}

#[instrument(skip(session))]
async fn run_create<A: GameApi>(session: &Session<A>, bet: &str, cell: usize) -> Result<()> {
    let bet_amount = stake::parse_display(bet)?;
    let mut pending = PendingMove::new();
    pending.select(cell_index(cell), Move::X);
    let submission = session.create(bet_amount, &mut pending).await;
    report(session.caller(), submission)
}

#[instrument(skip(session))]
async fn run_move<A: GameApi>(
    session: &Session<A>,
    game_id: u64,
    cell: usize,
    joining: bool,
) -> Result<()> {
    let game = session
        .api()
        .get_game(game_id)
        .await?
        .ok_or_else(|| anyhow!("Game {} not found", game_id))?;

    let mut pending = PendingMove::new();
    session.select_for(&game, cell_index(cell), &mut pending);
    let submission = if joining {
        session.join(game_id, &mut pending).await
    } else {
        session.play(game_id, &mut pending).await
    };
    report(session.caller(), submission)
}

fn report(viewer: &Address, submission: Result<Submission, SessionError>) -> Result<()> {
    let submission = match submission {
        Ok(submission) => submission,
        Err(SessionError::Submit(error)) => bail!("{}", error),
        Err(SessionError::Client(error)) => return Err(error.into()),
    };
    match submission.response.result {
        CallResult::Ok(id) => println!("Game #{}: call committed", id),
        CallResult::Err(code) => match GameError::from_code(code) {
            Some(error) => println!("Call rejected ({}): {}", code, error),
            None => println!("Call rejected with code {}", code),
        },
    }
    if let Some(game) = &submission.game {
        print_game(game, Some(viewer));
    }
    Ok(())
}

#[instrument(skip(client))]
async fn run_show(client: &HttpClient, game_id: u64, viewer: Option<&Address>) -> Result<()> {
    let game = client
        .get_game(game_id)
        .await?
        .ok_or_else(|| anyhow!("Game {} not found", game_id))?;
    print_game(&game, viewer);
    Ok(())
}

#[instrument(skip(client))]
async fn run_list(client: &HttpClient, viewer: Option<&Address>) -> Result<()> {
    let games = client.list_games().await?;
    let listing = GameListing::build(&games, viewer);
    for (title, group) in [
        ("Active Games", &listing.active),
        ("Joinable Games", &listing.joinable),
        ("Ended Games", &listing.ended),
    ] {
        if viewer.is_none() && title == "Active Games" {
            continue;
        }
        println!("{}", title);
        if group.is_empty() {
            println!("  (none)");
        }
        for game in group {
            println!("  {}", card_summary(game));
        }
    }
    Ok(())
}

fn print_game(game: &Game, viewer: Option<&Address>) {
    let view = PlayView::new(game, viewer);
    println!("Game #{}  bet {} STX", game.id(), stake::format_display(*game.bet_amount()));
    println!("Player one (X): {}", game.player_one().abbreviated());
    match game.player_two() {
        Some(player) => println!("Player two (O): {}", player.abbreviated()),
        None => println!("Player two (O): open"),
    }
    println!();
    println!("{}", game.board().display());
    println!();
    match game.winner() {
        Some(winner) => println!("Winner: {}", winner.abbreviated()),
        None if *view.is_game_over() => println!("Draw: stakes refunded"),
        None => println!("Next move: {}", view.next_move()),
    }
    if let Some(status) = view.status_line() {
        println!("{}", status);
    }
    if let Some(prompt) = view.prompt() {
        println!("Available: {}", prompt);
    }
}
