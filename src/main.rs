use clap::Parser;
use std::env;
use std::path::Path;

use tapebf::commands::eval::{self, EvalArgs};

#[derive(Parser, Debug)]
#[command(name = "tapebf", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    #[command(flatten)]
    args: EvalArgs,
}

fn main() {
    // Program name for help and error rendering, without its directory
    let program = env::args()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| String::from("tapebf"));

    let cli = Cli::parse();
    let code = eval::run(&program, cli.args);

    std::process::exit(code);
}
