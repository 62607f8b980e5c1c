use clap::Parser;
use log::info;

use codehint_rs::synth::{SynthConfig, Synthesizer};
use codehint_rs::value::{Callable, InvokeError, Record, Value};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Maximum expression depth.
    #[clap(long, value_name = "INT", default_value = "2")]
    depth: usize,

    /// Keep every expression, not only numbers.
    #[clap(long)]
    all: bool,

    /// Skip the equivalence expansion pass.
    #[clap(long)]
    no_expand: bool,

    /// Print every result with its value and depth.
    #[clap(short, long)]
    verbose: bool,
}

fn seeds() -> Vec<(&'static str, Value)> {
    let exp = Callable::new(2, |_, args| match (args[0].as_number(), args[1].as_number()) {
        (Some(x), Some(y)) => Ok(Value::from(x.powf(y))),
        _ => Err(InvokeError::thrown("Must give a number.")),
    });
    let live = Callable::new(1, |receiver, args| {
        let person = receiver
            .and_then(Value::as_record)
            .ok_or_else(|| InvokeError::Receiver("live() needs a person".to_string()))?;
        let x = args[0]
            .as_number()
            .ok_or_else(|| InvokeError::thrown("Must give a number."))?;
        let age = person.get("age").and_then(|v| v.as_number()).unwrap_or(0.0) + x;
        person.set("age", age);
        Ok(Value::from(age))
    });
    let answer = Callable::new(0, |_, _| Ok(Value::from(42)));
    let person = Record::new()
        .with("firstName", "John")
        .with("lastName", "Doe")
        .with("age", 42)
        .with("live", live)
        .with("answer", answer);

    vec![
        ("two", Value::from(2)),
        ("s", Value::from("live")),
        ("person", Value::from(person)),
        ("a", Value::array([Value::from(1), Value::from(2), Value::from(3)])),
        ("exp", Value::from(exp)),
        ("n", Value::Null),
        ("u", Value::Undefined),
    ]
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let args = Cli::parse();
    println!("args = {:?}", args);

    let config = SynthConfig::default()
        .with_max_depth(args.depth)
        .with_expansion(!args.no_expand);
    let synth = Synthesizer::new(config);
    info!("config = {:?}", synth.config());

    let time_total = std::time::Instant::now();
    let report = if args.all {
        synth.run_all(seeds())
    } else {
        synth.run(seeds(), Value::is_number)
    };
    let time_total = time_total.elapsed();

    if args.verbose {
        for e in &report.results {
            println!("{} = {} (depth {})", e, e.value(), e.depth());
        }
    }
    println!("{}", report.stats);
    println!(
        "Found {} results in {:.3}s.",
        report.results.len(),
        time_total.as_secs_f64()
    );

    Ok(())
}
