// src/main.rs

use std::process::ExitCode;

use autoclave::{cli, logging, run};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("autoclave error: {err:?}");
            ExitCode::from(1)
        }
    }
}

async fn run_main() -> anyhow::Result<u8> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
