use std::process::ExitCode;
use sv_isir_corrections::{cli, errors::AppError};

fn main() -> ExitCode {
    let args = cli::parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit());

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}", AppError::Io(e.to_string()));
            return ExitCode::from(1);
        }
    };

    ExitCode::from(rt.block_on(cli::run(args)))
}
