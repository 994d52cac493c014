use clap::Parser;
use dotenvy::dotenv;

mod command_def;
mod command_handler;
mod profile;

use command_def::Arguments;
use command_handler::handle_command;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    let code = handle_command(cli.command).await;
    std::process::exit(code);
}
