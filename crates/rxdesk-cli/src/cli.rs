//! Command line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rxdesk_core::api::client::DEFAULT_TREND_DAYS;
use rxdesk_core::auth::Route;
use rxdesk_core::models::{AlertPriority, AlertStatus, AlertType, NewMedicine};

/// Upper bound for `inventory --expiring-days`, roughly a century.
const MAX_EXPIRY_WINDOW_DAYS: i64 = 36_500;

#[derive(Debug, Parser)]
#[command(name = "rxdesk", version, about = "Pharmacy inventory dashboard in the terminal")]
pub struct Cli {
    /// Use the built-in simulated backend instead of the API server
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Read from the local cache instead of the network where possible
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List medicines
    Medicines {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one medicine
    Medicine { id: i64 },
    /// Add a medicine to the catalog
    AddMedicine(MedicineArgs),
    /// Replace a medicine's details
    UpdateMedicine {
        id: i64,
        #[command(flatten)]
        details: MedicineArgs,
    },
    /// Remove a medicine from the catalog
    DeleteMedicine { id: i64 },
    /// Bulk-add medicines from a CSV file or a JSON array (at most 5MB)
    Import { file: PathBuf },
    /// List medicine categories
    Categories,
    /// List stock batches
    Inventory {
        #[arg(long)]
        low_stock: bool,
        /// Batches expiring within N days (30 when no value is given)
        #[arg(
            long,
            num_args = 0..=1,
            default_missing_value = "30",
            value_parser = clap::value_parser!(i64).range(0..=MAX_EXPIRY_WINDOW_DAYS)
        )]
        expiring_days: Option<i64>,
    },
    /// Inventory totals
    Stats,
    /// List alerts
    Alerts {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        #[arg(long = "type", value_enum)]
        alert_type: Option<TypeArg>,
    },
    /// Show one alert
    Alert { id: i64 },
    /// Describe the alert types the server raises
    AlertTypes,
    /// Acknowledge an alert
    Ack { id: i64 },
    /// Resolve an alert
    Resolve { id: i64 },
    /// Dismiss an alert
    Dismiss { id: i64 },
    /// Dashboard figures and sales trend
    Dashboard {
        #[arg(long, default_value_t = DEFAULT_TREND_DAYS)]
        days: u32,
    },
    /// Supplier performance ranking
    Suppliers,
    /// Check a drug against conditions and current medications
    SafetyCheck {
        #[arg(long)]
        drug: String,
        #[arg(long = "condition")]
        conditions: Vec<String>,
        #[arg(long = "medication")]
        medications: Vec<String>,
    },
    /// Autocomplete drug names
    SearchDrugs { query: String },
}

impl Command {
    /// The dashboard page this command stands in for. `None` bypasses the guard.
    pub fn route(&self) -> Option<Route> {
        match self {
            Command::Login { .. } => Some(Route::Login),
            Command::Register { .. } => Some(Route::Register),
            Command::Logout => None,
            Command::Whoami => Some(Route::Settings),
            Command::Medicines { .. }
            | Command::Medicine { .. }
            | Command::AddMedicine(_)
            | Command::UpdateMedicine { .. }
            | Command::DeleteMedicine { .. }
            | Command::Import { .. }
            | Command::Categories
            | Command::Inventory { .. }
            | Command::Stats => Some(Route::Inventory),
            Command::Alerts { .. }
            | Command::Alert { .. }
            | Command::AlertTypes
            | Command::Ack { .. }
            | Command::Resolve { .. }
            | Command::Dismiss { .. } => Some(Route::Alerts),
            Command::Dashboard { .. } | Command::Suppliers => Some(Route::Analytics),
            Command::SafetyCheck { .. } | Command::SearchDrugs { .. } => Some(Route::Safety),
        }
    }
}

#[derive(Debug, Args)]
pub struct MedicineArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub price: f64,
    #[arg(long, default_value = "strip")]
    pub unit: String,
    #[arg(long)]
    pub generic_name: Option<String>,
    #[arg(long)]
    pub manufacturer: Option<String>,
    #[arg(long)]
    pub dosage: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

impl From<MedicineArgs> for NewMedicine {
    fn from(args: MedicineArgs) -> Self {
        NewMedicine {
            name: args.name,
            generic_name: args.generic_name.filter(|s| !s.is_empty()),
            category: args.category,
            manufacturer: args.manufacturer.filter(|s| !s.is_empty()),
            dosage: args.dosage.filter(|s| !s.is_empty()),
            price: args.price,
            unit: args.unit,
            description: args.description.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Unread,
    Acknowledged,
    Resolved,
}

impl From<StatusArg> for AlertStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Unread => AlertStatus::Unread,
            StatusArg::Acknowledged => AlertStatus::Acknowledged,
            StatusArg::Resolved => AlertStatus::Resolved,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Critical,
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for AlertPriority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Critical => AlertPriority::Critical,
            PriorityArg::High => AlertPriority::High,
            PriorityArg::Medium => AlertPriority::Medium,
            PriorityArg::Low => AlertPriority::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TypeArg {
    LowStock,
    Expiry,
    Anomaly,
    Forecast,
    System,
}

impl From<TypeArg> for AlertType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::LowStock => AlertType::LowStock,
            TypeArg::Expiry => AlertType::Expiry,
            TypeArg::Anomaly => AlertType::Anomaly,
            TypeArg::Forecast => AlertType::Forecast,
            TypeArg::System => AlertType::System,
        }
    }
}
