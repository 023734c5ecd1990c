//! Provider rewrite rule tables
//!
//! Each rule encodes one CDN provider's reverse-engineered URL contract. The
//! rules are data, not logic: hosts are matched by substring against the
//! first matching entry, and the rewrite mode says where size and quality
//! parameters are injected. Replace the table through `EngineConfig` to
//! adjust provider behavior.

use serde::{Deserialize, Serialize};

/// A single provider's URL rewrite contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRule {
    /// Substring matched against the URL host
    pub host_fragment: String,
    /// How size/quality parameters are injected
    pub rewrite: RewriteRule,
}

/// Where and how a provider accepts transformation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RewriteRule {
    /// Append width/quality to the query string
    QueryParams {
        width_param: String,
        quality_param: String,
        /// Query parameter carrying the blur radius, when the provider has one
        #[serde(default)]
        blur_param: Option<String>,
        /// Extra (key, value) pair requesting the next-gen format; only
        /// applied when the format probe reports decode support
        #[serde(default)]
        next_gen_param: Option<(String, String)>,
    },
    /// Insert a comma-joined transform segment into the path directly after
    /// an anchor segment (e.g. `/upload/` -> `/upload/w_640,q_80/`)
    PathSegment {
        anchor: String,
        /// Transform token enabling blur, when the provider has one
        #[serde(default)]
        blur_token: Option<String>,
        /// Transform token requesting the next-gen format, gated on the probe
        #[serde(default)]
        next_gen_token: Option<String>,
    },
}

/// Built-in rule table for the CDN providers the product serves media from
pub fn default_provider_rules() -> Vec<ProviderRule> {
    vec![
        ProviderRule {
            host_fragment: "images.unsplash.com".to_string(),
            rewrite: RewriteRule::QueryParams {
                width_param: "w".to_string(),
                quality_param: "q".to_string(),
                blur_param: Some("blur".to_string()),
                next_gen_param: Some(("fm".to_string(), "webp".to_string())),
            },
        },
        ProviderRule {
            host_fragment: "res.cloudinary.com".to_string(),
            rewrite: RewriteRule::PathSegment {
                anchor: "upload".to_string(),
                blur_token: Some("e_blur:1000".to_string()),
                next_gen_token: Some("f_webp".to_string()),
            },
        },
        ProviderRule {
            host_fragment: "imgix.net".to_string(),
            rewrite: RewriteRule::QueryParams {
                width_param: "w".to_string(),
                quality_param: "q".to_string(),
                blur_param: Some("blur".to_string()),
                next_gen_param: Some(("fm".to_string(), "webp".to_string())),
            },
        },
    ]
}
