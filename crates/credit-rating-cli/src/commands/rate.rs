use clap::Args;
use serde_json::Value;

use credit_rating_core::{calculate_issuer_rating, EngineConfig, IssuerRatingInput, Outlook};

use crate::input;

/// Arguments for the issuer rating pipeline
#[derive(Args)]
pub struct RateArgs {
    /// Path to JSON input file with the issuer rating request
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a configuration file, JSON or YAML by extension
    /// (defaults to the built-in tables)
    #[arg(long)]
    pub config: Option<String>,

    /// Override the sovereign rating from the input
    #[arg(long)]
    pub sovereign_rating: Option<String>,

    /// Override the sovereign outlook (positive, stable, negative)
    #[arg(long)]
    pub sovereign_outlook: Option<String>,

    /// Apply distress hardstop notching even if the input disables it
    #[arg(long)]
    pub enable_hardstops: bool,

    /// Apply the sovereign rating cap even if the input disables it
    #[arg(long)]
    pub enable_sovereign_cap: bool,
}

pub fn run_rate(args: RateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut rating_input: IssuerRatingInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input file or piped JSON is required for rating".into());
    };

    if let Some(sovereign) = args.sovereign_rating {
        rating_input.sovereign_rating = Some(sovereign);
    }
    if let Some(ref raw) = args.sovereign_outlook {
        rating_input.sovereign_outlook = Some(parse_outlook(raw)?);
    }
    if args.enable_hardstops {
        rating_input.enable_hardstops = true;
    }
    if args.enable_sovereign_cap {
        rating_input.enable_sovereign_cap = true;
    }

    let config = match args.config {
        Some(ref path) => input::file::read_config(path)?,
        None => EngineConfig::default(),
    };

    let result = calculate_issuer_rating(&rating_input, &config)?;
    Ok(serde_json::to_value(result)?)
}

fn parse_outlook(raw: &str) -> Result<Outlook, Box<dyn std::error::Error>> {
    match raw.to_ascii_lowercase().as_str() {
        "positive" => Ok(Outlook::Positive),
        "stable" => Ok(Outlook::Stable),
        "negative" => Ok(Outlook::Negative),
        _ => Err(format!(
            "Unknown outlook '{}': expected positive, stable, or negative",
            raw
        )
        .into()),
    }
}
