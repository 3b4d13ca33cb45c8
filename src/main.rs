//! Client Retention Prediction CLI
//!
//! Predicts whether a client will return for another hamper pickup.

use clap::{Args, Parser, Subcommand};
use retention::features::FeatureRecord;
use retention::{Config, OutputFormat, Result};

#[derive(Parser)]
#[command(name = "retention")]
#[command(about = "Client retention prediction from a pre-trained classifier", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the retention outcome for one client
    Predict {
        #[command(flatten)]
        features: FeatureArgs,
        /// Read feature values from a JSON file instead of flags
        #[arg(long, conflicts_with = "feature_flags")]
        input: Option<String>,
        /// Output format (table or json)
        #[arg(long)]
        format: Option<OutputFormat>,
    },
    /// Enter feature values interactively
    Form,
    /// List the input features and their defaults
    Features,
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

/// One flag per feature, in classifier order
#[derive(Args, Debug)]
#[group(id = "feature_flags", multiple = true)]
struct FeatureArgs {
    /// Days since the last hamper pickup
    #[arg(long, default_value_t = 10)]
    time_since_last_pickup: u32,
    #[arg(long, default_value_t = 1)]
    hamper_confirmation_type: u32,
    #[arg(long, default_value_t = 1)]
    preferred_contact_methods: u32,
    /// Client status code
    #[arg(long, default_value_t = 1)]
    status: u32,
    #[arg(long, default_value_t = 1)]
    sex_new: u32,
    /// Age in years
    #[arg(long, default_value_t = 35)]
    new_age_years: u32,
    /// Hamper demand 30 days earlier
    #[arg(long, default_value_t = 2)]
    hamper_demand_lag_30: u32,
    #[arg(long, default_value_t = 1)]
    latest_contact_method: u32,
    #[arg(long, default_value_t = 3)]
    dependents_qty: u32,
    /// Household size
    #[arg(long, default_value_t = 4)]
    household: u32,
    #[arg(long, default_value_t = 5)]
    contact_frequency: u32,
}

impl From<FeatureArgs> for FeatureRecord {
    fn from(a: FeatureArgs) -> Self {
        FeatureRecord {
            time_since_last_pickup: a.time_since_last_pickup,
            hamper_confirmation_type: a.hamper_confirmation_type,
            preferred_contact_methods: a.preferred_contact_methods,
            status: a.status,
            sex_new: a.sex_new,
            new_age_years: a.new_age_years,
            hamper_demand_lag_30: a.hamper_demand_lag_30,
            latest_contact_method: a.latest_contact_method,
            dependents_qty: a.dependents_qty,
            household: a.household,
            contact_frequency: a.contact_frequency,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Predict {
            features,
            input,
            format,
        } => commands::predict(&config, features.into(), input, format),
        Commands::Form => commands::form(&config),
        Commands::Features => commands::features(),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use retention::features::input::{confirm, prompt_record};
    use retention::features::FEATURE_SPEC;
    use retention::predict::{
        format_prediction, predict_one, prediction_json, ModelLoader, ModelState, Outcome,
    };

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        if let Some(dir) = config.model.path.parent() {
            std::fs::create_dir_all(dir)?;
            println!("Created {}/ directory", dir.display());
        }

        println!("\nNext steps:");
        println!(
            "  1. Place a trained model at {}",
            config.model.path.display()
        );
        println!("  2. Run 'retention predict' or 'retention form' to make predictions");

        Ok(())
    }

    pub fn features() -> Result<()> {
        println!("{:<28} {:<28} {:>7}", "Field", "Label", "Default");
        println!("{}", "─".repeat(65));
        for field in FEATURE_SPEC.iter() {
            println!("{:<28} {:<28} {:>7}", field.name, field.label, field.default);
        }
        Ok(())
    }

    pub fn predict(
        config: &Config,
        record: FeatureRecord,
        input: Option<String>,
        format: Option<OutputFormat>,
    ) -> Result<()> {
        let state = load_model(config)?;

        let record = match input {
            Some(path) => FeatureRecord::from_json(&std::fs::read_to_string(&path)?)?,
            None => record,
        };

        let outcome = predict_one(&record, state.handle())?;
        show(&record, outcome, format.unwrap_or(config.output.format));
        Ok(())
    }

    pub fn form(config: &Config) -> Result<()> {
        let state = load_model(config)?;

        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();

        println!("Client Retention Prediction");
        println!("Press Enter to keep the value shown in brackets.\n");

        loop {
            let record = prompt_record(&mut input, &mut output)?;
            match predict_one(&record, state.handle()) {
                Ok(outcome) => show(&record, outcome, config.output.format),
                Err(e) => eprintln!("Error: {}", e),
            }

            if !confirm(&mut input, &mut output, "Predict another client?")? {
                return Ok(());
            }
        }
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let info = ModelLoader::from_config(&config.model).describe()?;

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:           {}", info.path.display());
        println!("  Format:         {}", info.format);
        println!("  Size:           {} bytes", info.size_bytes);
        println!("  Model:          {}", info.description);

        Ok(())
    }

    fn load_model(config: &Config) -> Result<ModelState> {
        ModelLoader::from_config(&config.model).load()
    }

    fn show(record: &FeatureRecord, outcome: Outcome, format: OutputFormat) {
        match format {
            OutputFormat::Table => print!("{}", format_prediction(record, outcome)),
            OutputFormat::Json => match serde_json::to_string_pretty(&prediction_json(record, outcome)) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error: {}", e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("retention").chain(args.iter().copied()))
    }

    #[test]
    fn test_input_conflicts_with_feature_flags() {
        let err = parse(&["predict", "--input", "client.json", "--household", "6"])
            .err()
            .expect("--input with a feature flag should be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_input_alone_parses() {
        let cli = parse(&["predict", "--input", "client.json"]).unwrap();
        match cli.command {
            Commands::Predict { input, features, .. } => {
                assert_eq!(input.as_deref(), Some("client.json"));
                assert_eq!(FeatureRecord::from(features), FeatureRecord::default());
            }
            _ => panic!("expected predict"),
        }
    }

    #[test]
    fn test_feature_flags_override_defaults() {
        let cli = parse(&["predict", "--household", "6", "--new-age-years", "70"]).unwrap();
        match cli.command {
            Commands::Predict { features, input, .. } => {
                assert!(input.is_none());
                let record = FeatureRecord::from(features);
                assert_eq!(record.household, 6);
                assert_eq!(record.new_age_years, 70);
                assert_eq!(record.status, 1);
            }
            _ => panic!("expected predict"),
        }
    }
}
