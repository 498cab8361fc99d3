fn main() {
    qs_cli::init_logging();
    std::process::exit(qs_cli::run_cli_from_args(std::env::args_os()));
}
