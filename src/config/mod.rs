//! Configuration loading and management
//!
//! [`AppConfig`] is read from YAML and then adjusted by environment
//! variables. Every field has a default, so an empty file (or no file at
//! all) yields a working development setup backed by the in-memory store.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::query::ProductFilter;
use crate::core::service::{CatalogStore, UserStore};
use crate::entities::{Category, Product, Role, User};
use crate::orders::pricing::DiscountRule;

/// Environment variable naming the YAML config file
pub const CONFIG_PATH_ENV: &str = "LIVEWEAR_CONFIG";

/// Deployment environment
///
/// Defaults to production: internal error details reach clients only when
/// development is selected explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

/// Currency shown to storefront clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    pub code: String,
    pub symbol: String,
    pub name: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            code: "XOF".to_string(),
            symbol: "XOF ".to_string(),
            name: "Franc CFA".to_string(),
        }
    }
}

/// Which store backs the service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    #[default]
    Memory,
    Mongodb {
        uri: String,
        #[serde(default = "default_database")]
        database: String,
    },
}

fn default_database() -> String {
    "livewear".to_string()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; empty means any origin
    pub allowed_origins: Vec<String>,
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Socket address the HTTP server listens on
    pub bind: String,
    pub environment: Environment,
    pub app_name: String,
    pub version: String,
    pub currency: CurrencyConfig,
    /// Flat delivery fee advertised to clients
    pub delivery_fee: f64,
    /// Discount codes accepted at checkout (`CODE: { percent: 10 }`)
    pub discount_codes: HashMap<String, DiscountRule>,
    pub storage: StorageConfig,
    pub event_bus_capacity: usize,
    pub cors: CorsConfig,
    /// YAML file with users, categories and products to seed at startup
    pub fixtures: Option<PathBuf>,
    /// `tracing` filter directive, used when `RUST_LOG` is unset
    pub log_filter: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            environment: Environment::Production,
            app_name: "Livewear".to_string(),
            version: "1.0.0".to_string(),
            currency: CurrencyConfig::default(),
            delivery_fee: 10.0,
            discount_codes: HashMap::new(),
            storage: StorageConfig::Memory,
            event_bus_capacity: 1024,
            cors: CorsConfig::default(),
            fixtures: None,
            log_filter: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty document deserializes as null
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load the file named by `LIVEWEAR_CONFIG` (or defaults), then apply
    /// environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_yaml_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    ///
    /// Recognized keys: `LIVEWEAR_BIND`, `LIVEWEAR_ENV`, `MONGODB_URI`,
    /// `CURRENCY_CODE`, `CURRENCY_SYMBOL`, `DELIVERY_FEE`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("LIVEWEAR_BIND") {
            self.bind = bind;
        }
        if let Some(env) = lookup("LIVEWEAR_ENV") {
            self.environment = match env.trim().to_lowercase().as_str() {
                "development" | "dev" => Environment::Development,
                "production" | "prod" => Environment::Production,
                other => return Err(anyhow!("Unknown environment '{}'", other)),
            };
        }
        if let Some(uri) = lookup("MONGODB_URI") {
            let database = match &self.storage {
                StorageConfig::Mongodb { database, .. } => database.clone(),
                StorageConfig::Memory => default_database(),
            };
            self.storage = StorageConfig::Mongodb { uri, database };
        }
        if let Some(code) = lookup("CURRENCY_CODE") {
            self.currency.code = code;
        }
        if let Some(symbol) = lookup("CURRENCY_SYMBOL") {
            self.currency.symbol = symbol;
        }
        if let Some(fee) = lookup("DELIVERY_FEE") {
            self.delivery_fee = fee
                .trim()
                .parse()
                .with_context(|| format!("Invalid DELIVERY_FEE '{}'", fee))?;
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UserFixture {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryFixture {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductFixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    /// Name of a category declared in the same file
    pub category: String,
    #[serde(default)]
    pub image: String,
    pub stock: u32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
}

/// Seed data loaded at startup
///
/// ```yaml
/// users:
///   - { first_name: Ada, last_name: Admin, email: admin@livewear.test, role: admin }
/// categories:
///   - { name: Dresses }
/// products:
///   - { name: Linen dress, price: 45.0, category: Dresses, stock: 12 }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub users: Vec<UserFixture>,
    pub categories: Vec<CategoryFixture>,
    pub products: Vec<ProductFixture>,
}

/// What a fixture run created
#[derive(Debug, Default)]
pub struct Seeded {
    pub users: Vec<User>,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
}

impl Fixtures {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures file {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let fixtures: Self = serde_yaml::from_str(yaml)?;
        Ok(fixtures)
    }

    /// Insert everything into the given stores
    ///
    /// Users whose email is already taken are skipped, and the catalog part
    /// is skipped entirely once the store holds any category or product, so
    /// seeding a persistent store on every startup is harmless. Seeded users
    /// carry no password: authentication happens upstream.
    pub async fn seed(&self, users: &dyn UserStore, catalog: &dyn CatalogStore) -> Result<Seeded> {
        let mut seeded = Seeded::default();

        for fixture in &self.users {
            if users.find_user_by_email(&fixture.email).await?.is_some() {
                tracing::debug!(email = %fixture.email, "fixture user already present");
                continue;
            }
            let user = User::new(
                fixture.first_name.as_str(),
                fixture.last_name.as_str(),
                &fixture.email,
                "",
                fixture.role,
            );
            seeded.users.push(users.insert_user(user).await?);
        }

        let (_, existing_products) = catalog.list_products(&ProductFilter::default(), 0, 1).await?;
        if existing_products > 0 || !catalog.list_categories().await?.is_empty() {
            tracing::info!("catalog already populated, skipping catalog fixtures");
            return Ok(seeded);
        }

        let mut by_name = HashMap::new();
        for fixture in &self.categories {
            let mut category = Category::new(fixture.name.as_str());
            category.description = fixture.description.clone();
            let category = catalog.save_category(category).await?;
            by_name.insert(category.name.clone(), category.id);
            seeded.categories.push(category);
        }

        for fixture in &self.products {
            let category = by_name.get(&fixture.category).ok_or_else(|| {
                anyhow!(
                    "Product '{}' references unknown category '{}'",
                    fixture.name,
                    fixture.category
                )
            })?;
            let mut product = Product::new(
                fixture.name.as_str(),
                fixture.description.as_str(),
                fixture.price,
                *category,
                fixture.image.as_str(),
                fixture.stock,
            );
            product.is_featured = fixture.featured;
            product.sizes = fixture.sizes.clone();
            product.colors = fixture.colors.clone();
            seeded.products.push(catalog.save_product(product).await?);
        }

        tracing::info!(
            users = seeded.users.len(),
            categories = seeded.categories.len(),
            products = seeded.products.len(),
            "fixtures seeded"
        );

        Ok(seeded)
    }
}
