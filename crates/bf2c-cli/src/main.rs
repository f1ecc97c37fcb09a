use std::process::ExitCode;

fn main() -> ExitCode {
    match bf2c_cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("erreur: {e:#}");
            ExitCode::FAILURE
        }
    }
}
