use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    taskconf_cli::run()
}
