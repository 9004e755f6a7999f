use std::io;

use forkline::{logging, Config, Shell};

fn main() -> anyhow::Result::<()> {
    let config = Config::from_env()?;
    logging::init(&config)?;

    let mut shell = Shell::new(config);
    shell.run(io::stdin().lock());
    Ok(())
}
