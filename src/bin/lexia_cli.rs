use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;

use lexia_lib::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    // .env only supplies API keys during development
    dotenv::dotenv().ok();

    let args = Cli::parse();
    cli::init_logging(args.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let code = match cli::run(args, &mut out).await {
        Ok(code) => code,
        Err(e) => {
            log::debug!("Command failed: {:?}", e);
            eprintln!("Error: {}", e);
            1
        }
    };
    let _ = out.flush();
    ExitCode::from(code.clamp(0, 255) as u8)
}
