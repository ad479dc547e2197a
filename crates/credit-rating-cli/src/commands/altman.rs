use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use credit_rating_core::{compute_altman_z, AltmanComponents};

use crate::input;

/// Arguments for the Altman Z-Score calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AltmanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Working capital
    #[arg(long, alias = "wc")]
    pub working_capital: Option<Decimal>,

    /// Total assets
    #[arg(long, alias = "ta")]
    pub total_assets: Option<Decimal>,

    /// Retained earnings
    #[arg(long, alias = "re")]
    pub retained_earnings: Option<Decimal>,

    /// EBIT
    #[arg(long)]
    pub ebit: Option<Decimal>,

    /// Market value of equity
    #[arg(long, alias = "mve")]
    pub market_value_equity: Option<Decimal>,

    /// Total liabilities
    #[arg(long, alias = "tl")]
    pub total_liabilities: Option<Decimal>,

    /// Sales
    #[arg(long)]
    pub sales: Option<Decimal>,
}

pub fn run_altman(args: AltmanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let components: AltmanComponents = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        AltmanComponents {
            working_capital: args
                .working_capital
                .ok_or("--working-capital is required (or provide --input)")?,
            total_assets: args
                .total_assets
                .ok_or("--total-assets is required (or provide --input)")?,
            retained_earnings: args
                .retained_earnings
                .ok_or("--retained-earnings is required (or provide --input)")?,
            ebit: args.ebit.ok_or("--ebit is required (or provide --input)")?,
            market_value_equity: args
                .market_value_equity
                .ok_or("--market-value-equity is required (or provide --input)")?,
            total_liabilities: args
                .total_liabilities
                .ok_or("--total-liabilities is required (or provide --input)")?,
            sales: args.sales.ok_or("--sales is required (or provide --input)")?,
        }
    };

    let z = match compute_altman_z(&components) {
        Some(z) => z,
        None => {
            return Err(
                "Altman Z is undefined when total assets or total liabilities are zero".into(),
            )
        }
    };

    Ok(serde_json::json!({
        "altman_z": z,
        "altman_z_rounded": z.round_dp(3),
    }))
}
