use std::process::ExitCode;

fn main() -> ExitCode {
    match tern_cli::runner::main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
