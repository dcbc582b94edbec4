// northpath-backend/src/config/stripe.rs
use crate::domain::pricing_tier::PricingTier;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use stripe::Client;

pub static STRIPE_CLIENT: Lazy<Client> = Lazy::new(|| {
    let secret_key = env::var("STRIPE_SECRET_KEY").unwrap_or_else(|_| {
        tracing::warn!("STRIPE_SECRET_KEY not set, using empty key for development");
        String::new()
    });

    if secret_key.is_empty() {
        tracing::warn!("Stripe client initialized with empty key - payments will not work");
    }

    Client::new(secret_key)
});

#[derive(Clone, Debug, Default)]
pub struct StripeConfig {
    pub secret_key: String,
    pub publishable_key: String,
    /// ティアごとの価格ID (STRIPE_PRICE_<TIER>)
    pub price_ids: HashMap<PricingTier, String>,
    pub webhook_secret: String,
    pub development_mode: bool,
}

/// `one-time-diagnostic` -> `STRIPE_PRICE_ONE_TIME_DIAGNOSTIC`
pub fn price_env_key(tier: PricingTier) -> String {
    format!(
        "STRIPE_PRICE_{}",
        tier.as_str().to_uppercase().replace('-', "_")
    )
}

impl StripeConfig {
    pub fn development() -> Self {
        Self {
            development_mode: true,
            ..Default::default()
        }
    }

    pub fn from_env() -> Result<Self, String> {
        let development_mode = env::var("PAYMENT_DEVELOPMENT_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        if development_mode {
            tracing::info!("Payment development mode enabled - using mock responses");
            return Ok(Self::development());
        }

        let secret_key = env::var("STRIPE_SECRET_KEY")
            .map_err(|_| "STRIPE_SECRET_KEY must be set when not in development mode")?;
        let publishable_key = env::var("STRIPE_PUBLISHABLE_KEY").unwrap_or_default();

        let mut price_ids = HashMap::new();
        for tier in PricingTier::all() {
            let key = price_env_key(tier);
            match env::var(&key) {
                Ok(price_id) if price_id.starts_with("prod_") => {
                    tracing::error!(
                        env_key = %key,
                        price_id = %price_id,
                        "Configured value is a product ID, but it should be a price ID (starting with 'price_')"
                    );
                    return Err(format!("Invalid {}: Use price ID instead of product ID", key));
                }
                Ok(price_id) if !price_id.is_empty() => {
                    price_ids.insert(tier, price_id);
                }
                _ => {
                    tracing::debug!(env_key = %key, "No Stripe price configured for tier");
                }
            }
        }

        let webhook_secret = env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            tracing::warn!("STRIPE_WEBHOOK_SECRET not set - webhook verification will fail");
            String::new()
        });

        Ok(Self {
            secret_key,
            publishable_key,
            price_ids,
            webhook_secret,
            development_mode: false,
        })
    }

    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_") || self.development_mode
    }

    pub fn get_price_id(&self, tier: PricingTier) -> Option<&str> {
        self.price_ids.get(&tier).map(String::as_str)
    }

    /// 価格IDからティアを逆引き
    pub fn tier_for_price_id(&self, price_id: &str) -> Option<PricingTier> {
        self.price_ids
            .iter()
            .find(|(_, id)| id.as_str() == price_id)
            .map(|(tier, _)| *tier)
    }
}
