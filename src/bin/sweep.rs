use std::env;
use std::path::PathBuf;

use sweep_benchmark_rs::chart::write_family_chart;
use sweep_benchmark_rs::config::SweepConfig;
use sweep_benchmark_rs::driver::SweepDriver;
use sweep_benchmark_rs::report::print_report;
use tracing_subscriber::EnvFilter;

fn print_usage(program: &str) {
    eprintln!("Usage: {} [config.json] [output_dir]", program);
    eprintln!("  [config.json]  - Sweep definition; the built-in LEN/MLEN sweep if omitted");
    eprintln!("  [output_dir]   - Directory for the charts, overrides the config");
    eprintln!("       {} --print-default-config", program);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Get the command-line arguments
    let args: Vec<String> = env::args().collect();

    if args.iter().skip(1).any(|arg| arg == "-h" || arg == "--help") {
        print_usage(&args[0]);
        return;
    }

    if args.get(1).map(String::as_str) == Some("--print-default-config") {
        match SweepConfig::default().to_json() {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("Error: {}", err);
                std::process::exit(1);
            }
        }
        return;
    }

    let mut config = match args.get(1) {
        Some(path) => SweepConfig::load(path).unwrap_or_else(|err| {
            eprintln!("Error: could not load sweep config '{}': {}", path, err);
            std::process::exit(1);
        }),
        None => SweepConfig::default(),
    };
    if let Some(dir) = args.get(2) {
        config.output_dir = PathBuf::from(dir);
    }

    let plan = config.plan().unwrap_or_else(|err| {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    });
    let extractor = config.extractor().unwrap_or_else(|err| {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    });

    // Build and run every configuration, one after another
    let mut runner = config.runner();
    let outcome = SweepDriver::new(extractor).run(&plan, &mut runner);

    // Print the benchmark results
    print_report(&outcome, plan.families());

    // Draw one chart per family
    for (table, family) in outcome.tables.iter().zip(plan.families()) {
        match write_family_chart(table, family, &config.output_dir) {
            Ok(path) => println!("\nSaved results as {}", path.display()),
            Err(err) => eprintln!("Error: could not write chart for '{}': {}", family.name, err),
        }
    }
}
