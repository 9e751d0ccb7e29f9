// src/main.rs

use cmdstream::{cli, exit_codes, logging, run};

#[tokio::main]
async fn main() {
    let code = match run_main().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("cmdstream error: {err:?}");
            exit_codes::CMDSTREAM_ERROR
        }
    };
    std::process::exit(code);
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let outcome = run(args).await?;
    Ok(exit_codes::for_outcome(&outcome))
}
