// northpath-backend/src/utils/validation.rs

use crate::domain::pricing_tier::PricingTier;
use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

/// メールアドレス用正規表現
pub static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").unwrap()
});

/// kebab-case のティア名
pub static TIER_SLUG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]+(-[a-z]+)*$").unwrap());

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// ティア名バリデーション
pub fn validate_tier(tier: &str) -> Result<(), ValidationError> {
    if TIER_SLUG_REGEX.is_match(tier) && tier.parse::<PricingTier>().is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_tier"))
    }
}

/// メールアドレスをマスク
pub fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let masked_local = if local.len() <= 2 {
            "*".repeat(local.len())
        } else {
            format!("{}****", &local[..1])
        };
        format!("{}{}", masked_local, domain)
    } else {
        "****@****".to_string()
    }
}

/// HTML出力用エスケープ
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("user.name@domain.co.jp"));
        assert!(!is_valid_email("invalid-email"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("test@"));
    }

    #[test]
    fn test_validate_tier() {
        assert!(validate_tier("one-time-diagnostic").is_ok());
        assert!(validate_tier("ai-enterprise-partnership").is_ok());
        assert!(validate_tier("gold").is_err());
        assert!(validate_tier("One-Time-Diagnostic").is_err());
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("test@example.com"), "t****@example.com");
        assert_eq!(mask_email("ab@example.com"), "**@example.com");
        assert_eq!(mask_email("invalid"), "****@****");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"A&B's"</b>"#),
            "&lt;b&gt;&quot;A&amp;B&#39;s&quot;&lt;/b&gt;"
        );
    }
}
