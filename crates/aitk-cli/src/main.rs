mod check;
mod interactive;
mod server;
#[cfg(test)]
mod test_support;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use aitk_contracts::config::{load_secrets_file, Credentials, ToolkitSettings, DEFAULT_SECRETS_FILE};
use aitk_contracts::{ToolKind, ToolRequest};
use aitk_engine::Toolkit;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "aitk",
    version,
    about = "AI toolkit: research documents, image generation and website design feedback"
)]
struct Cli {
    /// key=value file holding OPENAI_API_KEY and GEMINI_API_KEY.
    #[arg(long, global = true, env = "AITK_SECRETS_FILE", default_value = DEFAULT_SECRETS_FILE)]
    secrets: PathBuf,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive tool menu (default).
    Menu,
    /// Research a topic and save a markdown document under references/.
    Search(InputArgs),
    /// Generate an image and save it under images/.
    Image(ImageArgs),
    /// Screenshot a website and save an AI design critique.
    Feedback(InputArgs),
    /// Serve the web interface and JSON API.
    Serve(ServeArgs),
    /// Report whether keys, directories and a headless browser are available.
    CheckConfig,
}

#[derive(Debug, Parser)]
struct InputArgs {
    /// Prompted for when omitted.
    words: Vec<String>,
}

#[derive(Debug, Parser)]
struct ImageArgs {
    words: Vec<String>,
    /// square, portrait or landscape (or 1024x1024, 1024x1792, 1792x1024).
    #[arg(long)]
    size: Option<String>,
}

#[derive(Debug, Parser)]
struct ServeArgs {
    #[arg(long, default_value_t = server::DEFAULT_PORT)]
    port: u16,
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Static front-end root; defaults to AITK_PUBLIC_DIR or ./public.
    #[arg(long)]
    public: Option<PathBuf>,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("aitk error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing();

    let secrets = load_secrets_file(&cli.secrets);
    let settings = ToolkitSettings::from_env();
    let credentials = Credentials::from_env();

    let command = cli.command.unwrap_or(Command::Menu);
    if let Command::CheckConfig = command {
        return check::run(&cli.secrets, &secrets, &settings, &credentials);
    }

    // Built before any tokio runtime: the blocking HTTP clients inside must
    // be created and dropped outside async contexts.
    let toolkit = Arc::new(Toolkit::from_settings(&settings, &credentials));

    match command {
        Command::Menu | Command::CheckConfig => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            interactive::run_menu(&toolkit, &mut input, &mut output, |input, output| {
                let running = server::RunningServer::start(
                    toolkit.clone(),
                    &settings.public_dir,
                    "127.0.0.1",
                    server::DEFAULT_PORT,
                )?;
                // Any line, or end of input, stops the server and returns to the menu.
                interactive::prompt_line(input, output, "")?;
                running.stop()
            })?;
            Ok(0)
        }
        Command::Search(args) => run_one_shot(&toolkit, ToolKind::WebSearch, &args.words, None),
        Command::Image(args) => run_one_shot(
            &toolkit,
            ToolKind::ImageGeneration,
            &args.words,
            args.size,
        ),
        Command::Feedback(args) => {
            run_one_shot(&toolkit, ToolKind::DesignFeedback, &args.words, None)
        }
        Command::Serve(args) => {
            let public_dir = args.public.unwrap_or_else(|| settings.public_dir.clone());
            server::serve(toolkit.clone(), &public_dir, &args.host, args.port)?;
            Ok(0)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_one_shot(
    toolkit: &Toolkit,
    kind: ToolKind,
    words: &[String],
    size: Option<String>,
) -> Result<i32> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let mut request = if words.is_empty() {
        match interactive::read_request(kind, &mut input, &mut output)? {
            Some(request) => request,
            None => return Ok(1),
        }
    } else {
        ToolRequest::new(kind, words.join(" "))
    };
    if let Some(size) = size {
        request = request.with_image_size(size);
    }

    let result = toolkit.execute(&request);
    interactive::print_result(&mut output, kind, &result)?;
    Ok(if result.success { 0 } else { 1 })
}
