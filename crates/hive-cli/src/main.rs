mod command;
mod logger;
mod model;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
