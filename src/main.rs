// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::Arc;
use std::time::Instant;
use the_featureset::backends::MemoryDriver;
use the_featureset::config::{load_config, HostOptions};
use the_featureset::host::{CacheSelector, Host};
use the_featureset::units::{set_unit_registry, ScaledUnitRegistry};
use the_featureset::value::Value;
use tracing_subscriber::EnvFilter;

/// One access requested on the command line.
enum Operation {
    Get(String),
    Set(String, Value),
}

impl Operation {
    fn parse(arg: &str) -> Self {
        match arg.split_once('=') {
            Some((name, value)) => Operation::Set(name.trim().to_string(), parse_value(value)),
            None => Operation::Get(arg.trim().to_string()),
        }
    }
}

/// Command line values: integers, floats and booleans, anything else is text.
fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Int(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        return Value::Float(float);
    }
    match raw {
        "true" | "True" => Value::Bool(true),
        "false" | "False" => Value::Bool(false),
        _ => Value::Str(raw.to_string()),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <class-file> [--no-cache] [name | name=value ...]", args[0]);
        eprintln!("Example: {} configs/power-supply.yaml", args[0]);
        eprintln!(
            "Example: {} configs/power-supply.yaml remote=on mode=CV mode display.brightness=3",
            args[0]
        );
        std::process::exit(1);
    }

    let registry = ScaledUnitRegistry::new()
        .with_si_unit("V", "voltage")
        .with_si_unit("A", "current")
        .with_si_unit("W", "power")
        .with_si_unit("Hz", "frequency");
    if let Err(e) = set_unit_registry(Arc::new(registry)) {
        eprintln!("❌ {}", e);
    }

    let no_cache = args[2..].iter().any(|a| a == "--no-cache");
    let operations: Vec<Operation> = args[2..]
        .iter()
        .filter(|a| a.as_str() != "--no-cache")
        .map(|a| Operation::parse(a))
        .collect();

    if let Err(e) = run(&args[1], no_cache, &operations) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

fn run(
    class_file: &str,
    no_cache: bool,
    operations: &[Operation],
) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    let config = load_config(class_file)?;
    let class = config.build()?;

    println!("📋 Class file: {}", class_file);
    if let Some(doc) = &config.doc {
        println!("📖 {}", doc);
    }
    println!();
    print!("{}", class.describe());

    if operations.is_empty() {
        return Ok(());
    }

    let options = if no_cache {
        HostOptions::without_cache()
    } else {
        config.options.clone()
    };
    let driver = Arc::new(MemoryDriver::new());
    let host = Host::new(class, driver.clone(), options);

    println!("\n🔄 Operations (simulated device):");
    for (i, operation) in operations.iter().enumerate() {
        match operation {
            Operation::Get(name) => match host.get_attribute(name) {
                Ok(value) => println!("  {}. {} → {}", i + 1, name, value),
                Err(e) => println!("  {}. {} ✗ {}", i + 1, name, e),
            },
            Operation::Set(name, value) => match host.set_attribute(name, value.clone()) {
                Ok(()) => println!("  {}. {} ← {}", i + 1, name, value),
                Err(e) => println!("  {}. {} ✗ {}", i + 1, name, e),
            },
        }
    }

    let snapshot = host.check_cache(&CacheSelector::all())?;
    println!("\n📊 Cache:");
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    println!(
        "\n🔢 Device calls: {} reads, {} writes, {} reconnects",
        driver.reads(),
        driver.writes(),
        driver.reconnects()
    );
    println!("⏱️  Total Time: {:?}", start_time.elapsed());
    Ok(())
}
