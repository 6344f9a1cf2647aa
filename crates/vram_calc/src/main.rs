use anyhow::Result;
use clap::Parser;
use vram_calc::app_config::AppConfig;
use vram_calc::cli::{Cli, Commands};
use vram_calc::{catalog_cmd, estimate, shell};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = AppConfig::load_or_default(&cli.app_config);

    // 1. Setup File Logging
    let file_appender = tracing_appender::rolling::daily(AppConfig::log_dir_for(&loaded), "vram_calc.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // 2. Setup Console Logging
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    // 3. Combine Subscribers
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)) // Stderr, keeps --json clean
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        ) // File
        .init();

    // 4. Setup Panic Hook
    std::panic::set_hook(Box::new(|panic_info| {
        let payload = panic_info.payload();
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            *s
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.as_str()
        } else {
            "Unknown panic"
        };

        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!(target: "panic", "🔥 CRASH detected at {}: {}", location, msg);
        eprintln!("🔥 CRASH detected at {}: {}", location, msg);
    }));

    let app = match loaded {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("❌ {:#}", e);
            return Err(e);
        }
    };
    tracing::debug!("vram_calc started with config {}", cli.app_config.display());

    match cli.command {
        Some(Commands::Shell(args)) => shell::run(args, &app)?,
        None => shell::run(Default::default(), &app)?,
        Some(Commands::Inference(args)) => estimate::run_inference(args, &app)?,
        Some(Commands::Training(args)) => estimate::run_training(args, &app)?,
        Some(Commands::Finetune(args)) => estimate::run_fine_tuning(args, &app)?,
        Some(Commands::Grpo(args)) => estimate::run_grpo(args, &app)?,
        Some(Commands::Multimodal(args)) => estimate::run_multimodal(args, &app)?,
        Some(Commands::Models(args)) => catalog_cmd::run_models(args, &app)?,
        Some(Commands::Gpus(args)) => catalog_cmd::run_gpus(args, &app)?,
        Some(Commands::Recommend(args)) => catalog_cmd::run_recommend(args, &app)?,
        Some(Commands::Init) => app.save(&cli.app_config)?,
    }

    Ok(())
}
