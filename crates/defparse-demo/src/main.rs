//! A small training launcher whose flags come from two functions.
//!
//! ```text
//! defparse-demo --data ./images --epochs 3 --size 64 64 --augment
//! RUST_LOG=defparse=debug defparse-demo --data ./images --dump
//! ```

use anyhow::Context;
use defparse::{callable, ArgumentParser, CallArgs, CallableOptions, Error, Ignore, Value};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Load a dataset.
///
/// Args:
///     data: directory holding the samples
///     size (Tuple[int, int]): resize target as width and height
///     augment: apply random flips
///     seed: shuffling seed
#[callable]
fn load(data: PathBuf, size: [u32; 2], augment: bool, #[arg(default = 0)] seed: u64) -> String {
    format!(
        "{} samples at {}x{} (augment: {}, seed: {})",
        data.display(),
        size[0],
        size[1],
        augment,
        seed
    )
}

/// Train a model.
///
/// # Arguments
///
/// * `epochs` - number of passes over the data
/// * `lr` (float) - learning rate
/// * `optimizer` - update rule
/// * `layers` - hidden layer widths
/// * `seed` - initialisation seed
/// * `log_every` - batches between progress lines
#[callable]
fn train(
    #[arg(default = 10)] epochs: u32,
    #[arg(default = Value::Float(0.01))] lr: Value,
    #[arg(ty = "Literal['sgd', 'adam']", default = "adam".to_string())] optimizer: String,
    layers: Option<Vec<u32>>,
    #[arg(default = 0)] seed: u64,
    log_every: Ignore<u32>,
) -> String {
    format!(
        "{} epochs of {} at lr {} with layers {:?} (seed: {}, log every {})",
        epochs, optimizer, lr, layers, seed, *log_every
    )
}

/// Output options.
///
/// Args:
///     dump: print the parsed flags as JSON before running
#[callable]
fn report(dump: bool) -> bool {
    dump
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut parser = ArgumentParser::builder()
        .name("defparse-demo")
        .about("Flags derived from the parameters of `load` and `train`")
        .version(env!("CARGO_PKG_VERSION"))
        .kebab_case()
        .build();

    let load = parser
        .add_callable_with(load__callable(), CallableOptions::new().group("Data"))
        .context("registering load")?;
    let train = parser
        .add_callable_with(train__callable(), CallableOptions::new().group("Training"))
        .context("registering train")?;
    let report = parser
        .add_callable_with(report__callable(), CallableOptions::new().group("Output"))
        .context("registering report")?;

    match parser.parse_env() {
        Ok(_) => {}
        Err(Error::Cli(err)) => err.exit(),
        Err(err) => return Err(err.into()),
    }

    if report.call(&parser)? {
        let parsed = parser.parsed().context("no parse result")?;
        println!("{}", serde_json::to_string_pretty(parsed)?);
    }

    println!("{}", load.call(&parser)?);
    println!(
        "{}",
        train.call_with(&parser, CallArgs::new().with("log_every", 100u32))?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_is_a_listed_toggle() {
        let mut parser = ArgumentParser::builder().name("defparse-demo").build();
        let report = parser
            .add_callable_with(report__callable(), CallableOptions::new().group("Output"))
            .unwrap();
        assert!(parser.render_help().contains("--dump"));

        parser.parse_from(Vec::<String>::new()).unwrap();
        assert!(!report.call(&parser).unwrap());
        parser.parse_from(["--dump"]).unwrap();
        assert!(report.call(&parser).unwrap());
    }
}
