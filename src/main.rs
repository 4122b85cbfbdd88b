use anyhow::Result;
use clap::Parser;
use shorts_strategist::app::{App, Update};
use shorts_strategist::cli::{self, Command};
use shorts_strategist::models::Config;
use shorts_strategist::render;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "shorts-strategist")]
#[command(about = "Generate YouTube Shorts strategies and thumbnails for a topic")]
struct CliArgs {
    /// Generate once for this topic, print, and exit instead of prompting.
    #[arg(long, value_name = "TOPIC", value_parser = parse_topic_arg)]
    topic: Option<String>,

    /// With --topic, also render a thumbnail for every strategy.
    #[arg(long, requires = "topic")]
    thumbnails: bool,

    /// With --topic, print JSON instead of text cards.
    #[arg(long, requires = "topic")]
    json: bool,

    /// Override STRATEGY_MODEL.
    #[arg(long, value_name = "MODEL")]
    strategy_model: Option<String>,

    /// Override THUMBNAIL_MODEL.
    #[arg(long, value_name = "MODEL")]
    thumbnail_model: Option<String>,
}

fn parse_topic_arg(input: &str) -> std::result::Result<String, String> {
    if input.trim().is_empty() {
        Err("Topic must not be empty".to_string())
    } else {
        Ok(input.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shorts_strategist=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(model) = args.strategy_model.clone() {
        config.strategy_model = model;
    }
    if let Some(model) = args.thumbnail_model.clone() {
        config.thumbnail_model = model;
    }

    info!("Starting shorts-strategist");
    let mut app = App::new(&config);

    match args.topic.as_deref() {
        Some(topic) => run_once(&mut app, topic, args.thumbnails, args.json).await,
        None => run_interactive(&mut app).await,
    }
}

async fn run_once(app: &mut App, topic: &str, thumbnails: bool, json: bool) -> Result<()> {
    app.submit(topic);
    app.settle().await;

    if let Some(message) = app.session().error() {
        error!("Generation failed: {}", message);
        std::process::exit(1);
    }

    if thumbnails {
        for index in 0..app.session().cards().len() {
            app.request_thumbnail(index);
        }
        app.settle().await;
    }

    if json {
        let cards: Vec<serde_json::Value> = app
            .session()
            .cards()
            .iter()
            .map(|card| -> serde_json::Result<serde_json::Value> {
                let mut value = serde_json::to_value(&card.record)?;
                value["thumbnail"] = card
                    .thumbnail_image()
                    .map(|image| serde_json::Value::String(image.data_uri()))
                    .unwrap_or(serde_json::Value::Null);
                Ok(value)
            })
            .collect::<serde_json::Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&cards)?);
    } else {
        print!("{}", render::render_session(app.session()));
    }
    Ok(())
}

async fn run_interactive(app: &mut App) -> Result<()> {
    run_lines(app, BufReader::new(tokio::io::stdin())).await
}

/// Drive the app from `input` until `quit` or end of input.
///
/// At end of input, requests still in flight are awaited and the final
/// session is printed; `quit` exits without waiting.
async fn run_lines<R: AsyncBufRead + Unpin>(app: &mut App, input: R) -> Result<()> {
    println!("Shorts Strategist\n{}\n", cli::HELP);
    println!("{}", render::render_status(app.session()));

    let mut lines = input.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    finish_pending(app).await;
                    break;
                };
                if !handle_line(app, &line) {
                    break;
                }
            }
            update = app.next_update(), if app.pending() > 0 => {
                match update {
                    Some(Update::Strategies { applied: true }) => {
                        print!("{}", render::render_session(app.session()));
                    }
                    Some(Update::Thumbnail { index, applied: true }) => {
                        if let Some(card) = app.session().card(index) {
                            print!("{}", render::render_card(index, card));
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    info!("Exiting with {} request(s) still in flight", app.pending());
    Ok(())
}

async fn finish_pending(app: &mut App) {
    if app.pending() == 0 {
        return;
    }
    info!("Input closed; waiting for {} request(s)", app.pending());
    app.settle().await;
    print!("{}", render::render_session(app.session()));
}

/// Handle one line of input. Returns `false` when the user asked to quit.
fn handle_line(app: &mut App, line: &str) -> bool {
    let command = match cli::parse_command(line) {
        Ok(command) => command,
        Err(message) => {
            println!("{}", message);
            return true;
        }
    };

    match command {
        Command::Generate(topic) => {
            if app.submit(&topic) {
                println!("{}", render::render_status(app.session()));
            } else if app.session().is_generating() {
                println!("Still generating; wait for the current request to finish.");
            } else {
                println!("Enter a non-empty topic.");
            }
        }
        Command::Toggle(index) => match app.toggle(index) {
            Some(_) => {
                if let Some(card) = app.session().card(index) {
                    print!("{}", render::render_card(index, card));
                }
            }
            None => println!("No card #{}", index + 1),
        },
        Command::Thumbnail(index) => {
            if app.request_thumbnail(index) {
                println!("Generating thumbnail for card #{}...", index + 1);
            } else {
                match app.session().card(index) {
                    None => println!("No card #{}", index + 1),
                    Some(card) if card.thumbnail_image().is_some() => {
                        println!("Card #{} already has a thumbnail.", index + 1)
                    }
                    Some(_) => println!("Card #{} is already generating.", index + 1),
                }
            }
        }
        Command::DataUri(index) => {
            match app.session().card(index).and_then(|c| c.thumbnail_image()) {
                Some(image) => println!("{}", image.data_uri()),
                None => println!("Card #{} has no thumbnail yet.", index + 1),
            }
        }
        Command::Show => print!("{}", render::render_session(app.session())),
        Command::Help => println!("{}", cli::HELP),
        Command::Quit => return false,
        Command::Empty => {}
    }
    true
}
