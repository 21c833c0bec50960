use std::process::ExitCode;

fn main() -> ExitCode {
    productservice_cli::run()
}
