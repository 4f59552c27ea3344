//! Command dispatch.
//!
//! `App` owns the auth context and the data backends for a single command.
//! Every command that maps to a route is checked by the route guard before
//! it touches the network.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Local;
use rxdesk_core::api::client::DEFAULT_TOP_LIMIT;
use rxdesk_core::api::ImportSummary;
use rxdesk_core::auth::SimulatedAuthProvider;
use rxdesk_core::cache::{CacheAges, CachedData};
use rxdesk_core::models::{
    Alert, AlertFilter, DashboardStats, InventoryItem, InventoryQuery, Medicine, MedicineQuery,
    NewMedicine, SafetyCheckRequest,
};
use rxdesk_core::{
    ApiClient, AuthContext, AuthProvider, CacheManager, Config, GuardDecision, InventoryBackend,
    Route,
};
use tracing::{debug, info, warn};

use crate::cli::Command;
use crate::demo;
use crate::output;

/// Environment variable consulted before prompting for a password.
const PASSWORD_ENV: &str = "RXDESK_PASSWORD";

/// Largest accepted import file.
const MAX_IMPORT_BYTES: u64 = 5 * 1024 * 1024;

pub struct App {
    config: Config,
    ctx: AuthContext<Box<dyn AuthProvider>>,
    api: ApiClient,
    inventory: Box<dyn InventoryBackend>,
    cache: Option<CacheManager>,
    simulate: bool,
    offline: bool,
}

impl App {
    /// Load config, restore the stored session and pick the backends.
    pub fn new(simulate: bool, offline: bool) -> Result<Self> {
        let config = Config::load()?;
        let simulate = simulate || config.simulate;
        let api = ApiClient::new(&config.api_base_url(), config.request_timeout())?;

        let provider: Box<dyn AuthProvider> = if simulate {
            Box::new(SimulatedAuthProvider::new())
        } else {
            Box::new(api.clone())
        };
        let inventory: Box<dyn InventoryBackend> = if simulate {
            Box::new(demo::demo_inventory())
        } else {
            Box::new(api.clone())
        };

        let cache = match config.cache_dir().and_then(CacheManager::new) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(error = %e, "Cache unavailable");
                None
            }
        };

        let ctx = AuthContext::new(config.session_store(), provider);
        Ok(Self::from_parts(config, ctx, api, inventory, cache, simulate, offline))
    }

    pub(crate) fn from_parts(
        config: Config,
        mut ctx: AuthContext<Box<dyn AuthProvider>>,
        api: ApiClient,
        inventory: Box<dyn InventoryBackend>,
        cache: Option<CacheManager>,
        simulate: bool,
        offline: bool,
    ) -> Self {
        ctx.init();
        let mut app = Self {
            config,
            ctx,
            api,
            inventory,
            cache,
            simulate,
            offline,
        };
        app.attach_token();
        app
    }

    /// Give the API client (and the HTTP inventory backend) the session token.
    fn attach_token(&mut self) {
        let Some(token) = self.ctx.token() else {
            return;
        };
        self.api.set_token(token);
        if !self.simulate {
            self.inventory = Box::new(self.api.clone());
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        let out = self.execute(command).await?;
        if !out.is_empty() {
            println!("{}", out);
        }
        Ok(())
    }

    pub(crate) async fn execute(&mut self, command: Command) -> Result<String> {
        if let Some(route) = command.route() {
            match self.ctx.navigate(route) {
                GuardDecision::Allow => {}
                GuardDecision::Redirect(Route::Login) => {
                    bail!("Not signed in. Run `rxdesk login` first.")
                }
                GuardDecision::Redirect(to) => {
                    let name = self.ctx.user().map(|u| u.display_name()).unwrap_or_default();
                    debug!(from = %route, to = %to, "Guest-only route");
                    return Ok(format!("Already signed in as {}.", name));
                }
                GuardDecision::Pending => bail!("Session is still loading"),
            }
        }

        match command {
            Command::Login { email } => {
                let email = match email.or_else(|| self.config.last_email.clone()) {
                    Some(email) => email,
                    None => prompt_line("Email: ")?,
                };
                let password = read_password()?;
                self.sign_in(&email, &password).await
            }
            Command::Register { name, email } => {
                let password = read_password()?;
                self.sign_up(&name, &email, &password).await
            }
            Command::Logout => Ok(self.sign_out()),
            Command::Whoami => Ok(self.whoami()),
            Command::Medicines { search, category } => {
                self.medicines(MedicineQuery { category, search }).await
            }
            Command::Medicine { id } => {
                self.require_online("medicine")?;
                let medicine = self.inventory.get_medicine(id).await?;
                Ok(output::medicine_detail(&medicine))
            }
            Command::AddMedicine(args) => {
                self.require_online("add-medicine")?;
                let payload = NewMedicine::from(args);
                payload.validate()?;
                let medicine = self.inventory.add_medicine(&payload).await?;
                info!(id = medicine.id, "Medicine added");
                Ok(format!("Added {} (#{}).", medicine.name, medicine.id))
            }
            Command::UpdateMedicine { id, details } => {
                self.require_online("update-medicine")?;
                let payload = NewMedicine::from(details);
                payload.validate()?;
                let medicine = self.inventory.update_medicine(id, &payload).await?;
                Ok(format!("Updated {} (#{}).", medicine.name, medicine.id))
            }
            Command::DeleteMedicine { id } => {
                self.require_online("delete-medicine")?;
                self.inventory.delete_medicine(id).await?;
                Ok(format!("Deleted medicine #{}.", id))
            }
            Command::Import { file } => {
                self.require_online("import")?;
                let rows = read_import_file(&file)?;
                let summary = self.inventory.import_medicines(&rows).await?;
                Ok(import_report(&summary))
            }
            Command::Categories => {
                self.require_online("categories")?;
                let list = self.inventory.categories().await?;
                Ok(format!("{}\n{} categories", list.categories.join("\n"), list.count))
            }
            Command::Inventory {
                low_stock,
                expiring_days,
            } => {
                let query = InventoryQuery {
                    low_stock: low_stock.then_some(true),
                    expiring_days,
                };
                self.stock(query).await
            }
            Command::Stats => {
                self.require_online("stats")?;
                let stats = self.inventory.stats().await?;
                Ok(output::inventory_stats(&stats))
            }
            Command::Alerts {
                status,
                priority,
                alert_type,
            } => {
                let filter = AlertFilter {
                    status: status.map(Into::into),
                    priority: priority.map(Into::into),
                    alert_type: alert_type.map(Into::into),
                };
                self.alerts(filter).await
            }
            Command::Alert { id } => {
                self.require_server("alert")?;
                let alert = self.api.fetch_alert(id).await?;
                Ok(output::alert_detail(&alert))
            }
            Command::AlertTypes => {
                self.require_server("alert-types")?;
                let types = self.api.fetch_alert_types().await?;
                Ok(serde_json::to_string_pretty(&types)?)
            }
            Command::Ack { id } => {
                self.require_server("ack")?;
                self.api.acknowledge_alert(id).await?;
                Ok(format!("Alert #{} acknowledged.", id))
            }
            Command::Resolve { id } => {
                self.require_server("resolve")?;
                self.api.resolve_alert(id).await?;
                Ok(format!("Alert #{} resolved.", id))
            }
            Command::Dismiss { id } => {
                self.require_server("dismiss")?;
                self.api.dismiss_alert(id).await?;
                Ok(format!("Alert #{} dismissed.", id))
            }
            Command::Dashboard { days } => self.dashboard(days).await,
            Command::Suppliers => {
                self.require_server("suppliers")?;
                let suppliers = self.api.fetch_supplier_performance().await?;
                Ok(output::supplier_table(&suppliers))
            }
            Command::SafetyCheck {
                drug,
                conditions,
                medications,
            } => {
                self.require_server("safety-check")?;
                let request = SafetyCheckRequest {
                    drug_name: drug,
                    conditions,
                    current_medications: medications,
                };
                let result = self.api.check_safety(&request).await?;
                Ok(serde_json::to_string_pretty(&result)?)
            }
            Command::SearchDrugs { query } => {
                self.require_server("search-drugs")?;
                let result = self.api.search_drugs(&query).await?;
                Ok(serde_json::to_string_pretty(&result)?)
            }
        }
    }

    async fn sign_in(&mut self, email: &str, password: &str) -> Result<String> {
        let next = self.ctx.login(email, password).await?;
        self.remember_email(email);
        self.attach_token();
        debug!(next = %next, "Signed in");
        Ok(self.greeting())
    }

    async fn sign_up(&mut self, name: &str, email: &str, password: &str) -> Result<String> {
        self.ctx.register(name, email, password).await?;
        self.remember_email(email);
        self.attach_token();
        Ok(self.greeting())
    }

    fn sign_out(&mut self) -> String {
        self.ctx.logout();
        self.api.clear_token();
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear() {
                warn!(error = %e, "Failed to clear cache on logout");
            }
        }
        "Signed out.".to_string()
    }

    fn greeting(&self) -> String {
        match self.ctx.user() {
            Some(user) => format!("Signed in as {} ({}).", user.display_name(), user.role),
            None => "Signed in.".to_string(),
        }
    }

    fn whoami(&self) -> String {
        let Some(user) = self.ctx.user() else {
            return "Not signed in.".to_string();
        };
        let mut out = format!(
            "{} <{}>\nRole: {}\nUser ID: {}",
            user.display_name(),
            user.email,
            user.role,
            user.id
        );
        if self.simulate {
            out.push_str("\nBackend: simulated");
        } else {
            out.push_str(&format!("\nBackend: {}", self.api.base_url()));
        }
        if let Some(cache) = &self.cache {
            let ages = cache.get_cache_ages();
            out.push_str(&format!(
                "\nCache: medicines {}, inventory {}, alerts {}, dashboard {}",
                CacheAges::display(&ages.medicines),
                CacheAges::display(&ages.inventory),
                CacheAges::display(&ages.alerts),
                CacheAges::display(&ages.dashboard),
            ));
        }
        out
    }

    fn remember_email(&mut self, email: &str) {
        if self.config.last_email.as_deref() == Some(email) {
            return;
        }
        self.config.last_email = Some(email.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    async fn medicines(&mut self, query: MedicineQuery) -> Result<String> {
        if self.offline {
            let cached = self.cached(self.cache()?.load_medicines()?, "medicines")?;
            let matching: Vec<Medicine> = cached
                .data
                .into_iter()
                .filter(|m| query.matches(m))
                .collect();
            return Ok(with_age(output::medicine_table(&matching), &cached.cached_at));
        }

        let medicines = self.inventory.list_medicines(&query).await?;
        if query.category.is_none() && query.search.is_none() {
            if let Some(cache) = &self.cache {
                if let Err(e) = cache.save_medicines(&medicines) {
                    warn!(error = %e, "Failed to cache medicines");
                }
            }
        }
        Ok(output::medicine_table(&medicines))
    }

    async fn stock(&mut self, query: InventoryQuery) -> Result<String> {
        let unfiltered = query.low_stock.is_none() && query.expiring_days.is_none();

        if self.offline {
            let cached = self.cached(self.cache()?.load_inventory()?, "inventory")?;
            let today = Local::now().date_naive();
            let matching: Vec<InventoryItem> = cached
                .data
                .into_iter()
                .filter(|item| {
                    if query.low_stock == Some(true) {
                        item.is_low_stock()
                    } else if let Some(days) = query.expiring_days {
                        item.expires_within(today, days)
                    } else {
                        true
                    }
                })
                .collect();
            return Ok(with_age(output::inventory_table(&matching), &cached.cached_at));
        }

        let items = self.inventory.list_inventory(&query).await?;
        if unfiltered {
            if let Some(cache) = &self.cache {
                if let Err(e) = cache.save_inventory(&items) {
                    warn!(error = %e, "Failed to cache inventory");
                }
            }
        }
        Ok(output::inventory_table(&items))
    }

    async fn alerts(&mut self, filter: AlertFilter) -> Result<String> {
        let unfiltered =
            filter.status.is_none() && filter.priority.is_none() && filter.alert_type.is_none();

        if self.offline {
            let cached = self.cached(self.cache()?.load_alerts()?, "alerts")?;
            let matching: Vec<Alert> = cached
                .data
                .into_iter()
                .filter(|a| filter.status.map(|s| a.status == s).unwrap_or(true))
                .filter(|a| filter.priority.map(|p| a.priority == p).unwrap_or(true))
                .filter(|a| filter.alert_type.map(|t| a.alert_type == t).unwrap_or(true))
                .collect();
            return Ok(with_age(output::alert_table(&matching), &cached.cached_at));
        }

        self.require_server("alerts")?;
        let mut alerts = self.api.fetch_alerts(&filter).await?;
        alerts.sort_by(|a, b| a.priority.cmp(&b.priority));
        let summary = match self.api.fetch_alert_stats().await {
            Ok(stats) => Some(output::alert_stats(&stats)),
            Err(e) => {
                debug!(error = %e, "Alert stats unavailable");
                match self.api.fetch_unread_count().await {
                    Ok(count) => Some(format!("{} unread", count.unread_count)),
                    Err(e) => {
                        debug!(error = %e, "Unread count unavailable");
                        None
                    }
                }
            }
        };
        if unfiltered {
            if let Some(cache) = &self.cache {
                if let Err(e) = cache.save_alerts(&alerts) {
                    warn!(error = %e, "Failed to cache alerts");
                }
            }
        }
        let table = output::alert_table(&alerts);
        Ok(match summary {
            Some(line) => format!("{}\n{}", line, table),
            None => table,
        })
    }

    async fn dashboard(&mut self, days: u32) -> Result<String> {
        if self.offline {
            let cached = self.cached(self.cache()?.load_dashboard()?, "dashboard")?;
            return Ok(with_age(
                output::dashboard(&cached.data, &[], &[]),
                &cached.cached_at,
            ));
        }

        if self.simulate {
            let stats = self.inventory.stats().await?;
            let summary = DashboardStats {
                total_medicines: stats.total_medicines,
                total_inventory_value: stats.total_value,
                low_stock_items: stats.low_stock_count,
                expiring_soon: stats.expiring_soon_count,
            };
            return Ok(output::dashboard(&summary, &[], &[]));
        }

        let stats = self.api.fetch_dashboard().await?;
        let trends = self.api.fetch_sales_trends(days).await?;
        let categories = self.api.fetch_category_distribution().await?;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save_dashboard(&stats) {
                warn!(error = %e, "Failed to cache dashboard");
            }
        }

        let mut out = output::dashboard(&stats, &trends, &categories);
        match self.api.fetch_inventory_value().await {
            Ok(value) => out.push_str(&format!(
                "\n\nInventory value by category:\n{}",
                serde_json::to_string_pretty(&value)?
            )),
            Err(e) => debug!(error = %e, "Inventory value breakdown unavailable"),
        }
        match self.api.fetch_top_medicines(DEFAULT_TOP_LIMIT).await {
            Ok(top) => out.push_str(&format!(
                "\n\nTop medicines:\n{}",
                serde_json::to_string_pretty(&top)?
            )),
            Err(e) => debug!(error = %e, "Top medicines unavailable"),
        }
        Ok(out)
    }

    fn cache(&self) -> Result<&CacheManager> {
        self.cache
            .as_ref()
            .context("Offline mode needs a cache directory")
    }

    fn cached<T>(&self, loaded: Option<CachedData<T>>, what: &str) -> Result<CachedData<T>> {
        match loaded {
            Some(cached) => {
                if cached.is_stale() {
                    warn!(cache = what, age = %cached.age_display(), "Showing stale cache");
                }
                Ok(cached)
            }
            None => bail!("No cached {}. Run the command once without --offline.", what),
        }
    }

    fn require_online(&self, command: &str) -> Result<()> {
        if self.offline {
            bail!("`{}` is not available with --offline", command);
        }
        Ok(())
    }

    /// Alerts, analytics and safety live only on the API server.
    fn require_server(&self, command: &str) -> Result<()> {
        self.require_online(command)?;
        if self.simulate {
            bail!("`{}` needs the API server and is not available with --simulate", command);
        }
        Ok(())
    }
}

fn with_age(table: String, cached_at: &chrono::DateTime<chrono::Utc>) -> String {
    format!(
        "{}\n(cached {})",
        table,
        output::format_date(&cached_at.to_rfc3339())
    )
}

/// Read import rows from a `.csv` file with a header row or a `.json` array.
fn read_import_file(path: &Path) -> Result<Vec<NewMedicine>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let is_csv = match extension.as_deref() {
        Some("csv") => true,
        Some("json") => false,
        _ => bail!("Please upload a valid CSV or JSON file"),
    };

    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .len();
    if size > MAX_IMPORT_BYTES {
        bail!("File size must be less than 5MB");
    }

    if is_csv {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<NewMedicine>, csv::Error>>()
            .with_context(|| format!("{} has a malformed row", path.display()))?;
        return Ok(rows);
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of medicines", path.display()))
}

fn import_report(summary: &ImportSummary) -> String {
    let mut out = format!("Imported {} medicine(s).", summary.imported.len());
    for (row, reason) in &summary.rejected {
        out.push_str(&format!("\n  row {}: {}", row + 1, reason));
    }
    if !summary.is_clean() {
        out.push_str(&format!("\n{} row(s) skipped.", summary.rejected.len()));
    }
    out
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    rpassword::prompt_password("Password: ").context("Failed to read password")
}
