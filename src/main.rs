//! Handle Sniper - exhaustive handle availability scanning
//!
//! Walks every handle of a fixed length, probes each against the target
//! site and appends the verdict to a results file.

use handle_sniper::{
    types::{Classification, ProbeRecord},
    FileSink, HttpOracle, ProbeScheduler, Result, RunConfig, RunState, RunSummary,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const EXIT_CONFIG: i32 = 2;
const EXIT_RUNTIME: i32 = 1;
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() {
    // Initialize the library
    if let Err(e) = handle_sniper::init() {
        eprintln!("❌ Failed to initialize: {}", e);
        process::exit(EXIT_RUNTIME);
    }

    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("handle-sniper {}", handle_sniper::VERSION);
        return;
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.user_message());
            process::exit(EXIT_CONFIG);
        }
    };

    match run_sniper(config).await {
        Ok(summary) => {
            if summary.state == RunState::Cancelled {
                process::exit(EXIT_CANCELLED);
            }
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            process::exit(if e.is_fatal() { EXIT_CONFIG } else { EXIT_RUNTIME });
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "handle_sniper=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Environment first, then flags; validated before anything touches the network
fn load_config(args: &[String]) -> Result<RunConfig> {
    let mut config = RunConfig::from_env()?;
    config.apply_args(args)?;
    config.validate()?;
    Ok(config)
}

/// Main scan workflow
async fn run_sniper(config: RunConfig) -> Result<RunSummary> {
    let enumerator = config.enumerator()?;
    let throttle = config.throttle()?;
    let oracle = HttpOracle::for_target(&config.target, config.probe_timeout(), config.concurrency)?;
    let sink = FileSink::open(&config.output, config.format).await?;
    let total = enumerator.total();

    println!("🎯 Handle Sniper - exhaustive handle availability scan");
    println!("═══════════════════════════════════════════════════════");
    println!("   🔤 Alphabet: {}", enumerator.keyspace().alphabet().iter().collect::<String>());
    println!("   📏 Length: {}  Suffix: {:?}", config.length, config.suffix);
    println!("   🧮 Candidates: {}  Order: {}", total, enumerator.order());
    println!("   🌐 Target: {}", oracle.base_url());
    println!("   ⚙️  Workers: {}  Pacing: {}", config.concurrency, throttle.describe());
    println!("   📝 Output: {} ({})", config.output.display(), config.format);
    println!();

    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg} (eta {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );

    let observer_bar = bar.clone();
    let scheduler = ProbeScheduler::new(
        enumerator,
        Arc::new(oracle),
        Arc::new(sink),
        throttle,
        config.scheduler_config(),
    )?
    .with_observer(move |record, progress| {
        observer_bar.println(format_record(record));
        observer_bar.set_position(progress.completed);
        observer_bar.set_message(format!(
            "taken {} · free {} · ? {}",
            progress.taken, progress.free, progress.indeterminate
        ));
    });

    let shutdown = scheduler.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Shutdown requested, finishing in-flight probes");
            shutdown.shutdown();
        }
    });

    let summary = scheduler.run().await;
    bar.finish_and_clear();
    print_summary(&summary, &config);

    Ok(summary)
}

fn format_record(record: &ProbeRecord) -> String {
    match record.classification {
        Classification::Taken => format!("❌ {} - TAKEN ({})", record.candidate, record.detail()),
        Classification::Free => format!("✅ {} - FREE ({})", record.candidate, record.detail()),
        Classification::Indeterminate => {
            format!("⚠️  {} - UNKNOWN ({})", record.candidate, record.detail())
        }
    }
}

fn print_summary(summary: &RunSummary, config: &RunConfig) {
    println!();
    match summary.state {
        RunState::AllWorkersExhausted => println!("🏁 All possible handles have been checked"),
        RunState::Cancelled => println!("🛑 Scan cancelled before the keyspace was exhausted"),
    }
    println!("📈 Summary:");
    println!("   ✅ Free: {}", summary.free);
    println!("   ❌ Taken: {}", summary.taken);
    if summary.indeterminate > 0 {
        println!("   ⚠️  Indeterminate: {}", summary.indeterminate);
    }
    if summary.sink_failures > 0 {
        println!("   💾 Records not persisted: {}", summary.sink_failures);
    }
    println!("   📊 Checked: {}/{}", summary.completed(), summary.total);
    println!("   ⏱️  Total time: {:.2}s", summary.elapsed.as_secs_f32());
    println!("   📝 Results: {}", config.output.display());
}

/// Print help information
fn print_help() {
    println!("🎯 Handle Sniper - exhaustive handle availability scan");
    println!("═══════════════════════════════════════════════════════");
    println!();
    println!("USAGE:");
    println!("    handle-sniper [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -l, --length N         Handle length (default: 4)");
    println!("        --letters-only     Use a-z only (default: a-z0-9)");
    println!("        --digits           Use a-z0-9");
    println!("        --alphabet STR     Explicit alphabet, overrides the two above");
    println!("        --suffix STR       Suffix appended to every handle");
    println!("    -c, --concurrency N    Concurrent probes (default: 1)");
    println!("        --min-delay MS     Minimum pause after each probe (default: 500)");
    println!("        --max-delay MS     Maximum pause after each probe (default: 1500)");
    println!("        --rate N           Global probes per second (replaces the random pause)");
    println!("        --timeout MS       Per-probe timeout (default: 10000)");
    println!("        --order ORDER      sequential | shuffled | random (default: sequential)");
    println!("        --seed N           Seed for shuffled/random order");
    println!("    -t, --target NAME|URL  github | gitlab | codeberg | http(s) base URL (default: github)");
    println!("    -o, --output PATH      Results file (default: results.txt)");
    println!("        --format FMT       text | jsonl (default: text)");
    println!("    -h, --help             Show this help");
    println!("    -V, --version          Show version");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("    SNIPER_LENGTH, SNIPER_DIGITS, SNIPER_ALPHABET, SNIPER_SUFFIX,");
    println!("    SNIPER_CONCURRENCY, SNIPER_MIN_DELAY_MS, SNIPER_MAX_DELAY_MS, SNIPER_RATE,");
    println!("    SNIPER_TIMEOUT_MS, SNIPER_ORDER, SNIPER_SEED, SNIPER_TARGET, SNIPER_OUTPUT,");
    println!("    SNIPER_FORMAT  (a .env file is loaded if present; flags win)");
    println!("    RUST_LOG       Log filter (default: handle_sniper=warn)");
    println!();
    println!("EXIT STATUS:");
    println!("    0 keyspace exhausted, 1 runtime failure, 2 invalid configuration, 130 cancelled");
}
