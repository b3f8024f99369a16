//! User-agent classification: human visitors vs. crawlers vs. social preview bots.
//!
//! A flat substring match against every known bot token misfires on real
//! browsers whose user agent happens to carry an overlapping token. The
//! classifier therefore works in two tiers: agents that look like an ordinary
//! browser are only checked against a short list of bots known to spoof
//! browser user agents, while everything else is checked against the full
//! crawler list. Social preview detection runs independently of both.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// Which step of the classification a pattern belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Ordinary desktop-browser signatures
    Browser,
    /// Unambiguous bots that spoof browser user agents
    SpoofingBot,
    /// Full crawler / link-unfurler list, only for non-browser agents
    Crawler,
    /// Social preview bots, checked regardless of the other tiers
    SocialPreview,
}

/// Result category of a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCategory {
    Human,
    GenericBot,
    SocialBot,
}

/// Ordered pattern table. Patterns are case-insensitive and written in the
/// regex subset shared by Rust and JavaScript so the same table drives the
/// client-side bootstrap.
pub const PATTERNS: &[(Tier, BotCategory, &str)] = &[
    (Tier::Browser, BotCategory::Human, r"chrome/\d+"),
    (Tier::Browser, BotCategory::Human, r"firefox/\d+"),
    (Tier::Browser, BotCategory::Human, r"safari/\d+"),
    (Tier::Browser, BotCategory::Human, r"edge/\d+"),
    (Tier::Browser, BotCategory::Human, r"opera/\d+"),
    (Tier::SpoofingBot, BotCategory::GenericBot, r"googlebot"),
    (Tier::SpoofingBot, BotCategory::GenericBot, r"bingbot"),
    (Tier::SpoofingBot, BotCategory::GenericBot, r"headlesschrome"),
    (Tier::SpoofingBot, BotCategory::GenericBot, r"phantomjs"),
    (Tier::Crawler, BotCategory::GenericBot, r"googlebot"),
    (Tier::Crawler, BotCategory::GenericBot, r"bingbot"),
    (Tier::Crawler, BotCategory::GenericBot, r"slurp"),
    (Tier::Crawler, BotCategory::GenericBot, r"duckduckbot"),
    (Tier::Crawler, BotCategory::GenericBot, r"baiduspider"),
    (Tier::Crawler, BotCategory::GenericBot, r"yandexbot"),
    (Tier::Crawler, BotCategory::GenericBot, r"sogou"),
    (Tier::Crawler, BotCategory::GenericBot, r"exabot"),
    (Tier::Crawler, BotCategory::GenericBot, r"applebot"),
    (Tier::Crawler, BotCategory::GenericBot, r"ia_archiver"),
    (Tier::Crawler, BotCategory::GenericBot, r"facebot"),
    (Tier::Crawler, BotCategory::GenericBot, r"facebookexternalhit"),
    (Tier::Crawler, BotCategory::GenericBot, r"twitterbot"),
    (Tier::Crawler, BotCategory::GenericBot, r"linkedinbot"),
    (Tier::Crawler, BotCategory::GenericBot, r"whatsapp"),
    (Tier::Crawler, BotCategory::GenericBot, r"telegrambot"),
    (Tier::Crawler, BotCategory::GenericBot, r"slackbot"),
    (Tier::Crawler, BotCategory::GenericBot, r"discordbot"),
    (Tier::Crawler, BotCategory::GenericBot, r"pinterest"),
    (Tier::Crawler, BotCategory::GenericBot, r"redditbot"),
    (Tier::Crawler, BotCategory::GenericBot, r"skypeuripreview"),
    (Tier::Crawler, BotCategory::GenericBot, r"headlesschrome"),
    (Tier::Crawler, BotCategory::GenericBot, r"phantomjs"),
    (Tier::SocialPreview, BotCategory::SocialBot, r"facebook"),
    (Tier::SocialPreview, BotCategory::SocialBot, r"twitter"),
    (Tier::SocialPreview, BotCategory::SocialBot, r"whatsapp"),
    (Tier::SocialPreview, BotCategory::SocialBot, r"telegram"),
    (Tier::SocialPreview, BotCategory::SocialBot, r"linkedin"),
    (Tier::SocialPreview, BotCategory::SocialBot, r"slack"),
    (Tier::SocialPreview, BotCategory::SocialBot, r"discord"),
    (Tier::SocialPreview, BotCategory::SocialBot, r"pinterest"),
    (Tier::SocialPreview, BotCategory::SocialBot, r"reddit"),
    (Tier::SocialPreview, BotCategory::SocialBot, r"skype"),
];

/// Outcome of classifying one user agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotClassification {
    pub category: BotCategory,
    /// Pattern that decided the category, if any
    pub matched_pattern: Option<String>,
    /// True when the social preview sublist matched
    pub social: bool,
}

impl BotClassification {
    pub fn is_bot(&self) -> bool {
        self.category != BotCategory::Human || self.social
    }

    pub fn is_social_bot(&self) -> bool {
        self.social
    }
}

struct CompiledPattern {
    tier: Tier,
    source: &'static str,
    regex: Regex,
}

/// Compiled form of [`PATTERNS`]
pub struct BotClassifier {
    patterns: Vec<CompiledPattern>,
}

impl Default for BotClassifier {
    fn default() -> Self {
        Self::new().expect("Built-in bot patterns should be valid")
    }
}

impl BotClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        let mut patterns = Vec::with_capacity(PATTERNS.len());
        for (tier, _, source) in PATTERNS {
            let regex = RegexBuilder::new(source).case_insensitive(true).build()?;
            patterns.push(CompiledPattern {
                tier: *tier,
                source,
                regex,
            });
        }
        Ok(Self { patterns })
    }

    /// First pattern of `tier` matching `user_agent`
    fn first_match(&self, tier: Tier, user_agent: &str) -> Option<&'static str> {
        self.patterns
            .iter()
            .filter(|p| p.tier == tier)
            .find(|p| p.regex.is_match(user_agent))
            .map(|p| p.source)
    }

    /// Steps 1-3: browser-looking agents only get the narrow spoofing check,
    /// everything else gets the full crawler list.
    fn two_tier_bot_match(&self, user_agent: &str) -> Option<&'static str> {
        match self.first_match(Tier::Browser, user_agent) {
            Some(browser) => {
                ::log::trace!("User agent matched browser signature {}", browser);
                self.first_match(Tier::SpoofingBot, user_agent)
            }
            None => self.first_match(Tier::Crawler, user_agent),
        }
    }

    pub fn classify(&self, user_agent: &str) -> BotClassification {
        let bot = self.two_tier_bot_match(user_agent);
        let social = self.first_match(Tier::SocialPreview, user_agent);

        let classification = match (bot, social) {
            (Some(pattern), social) => BotClassification {
                category: BotCategory::GenericBot,
                matched_pattern: Some(pattern.to_string()),
                social: social.is_some(),
            },
            (None, Some(pattern)) => BotClassification {
                category: BotCategory::SocialBot,
                matched_pattern: Some(pattern.to_string()),
                social: true,
            },
            (None, None) => BotClassification {
                category: BotCategory::Human,
                matched_pattern: None,
                social: false,
            },
        };

        ::log::debug!(
            "Classified user agent as {:?} (pattern: {:?})",
            classification.category,
            classification.matched_pattern
        );
        classification
    }
}

static CLASSIFIER: LazyLock<BotClassifier> = LazyLock::new(BotClassifier::default);

/// Classify with the shared built-in classifier
pub fn classify(user_agent: &str) -> BotClassification {
    CLASSIFIER.classify(user_agent)
}

fn js_regex_list(tier: Tier) -> String {
    let items: Vec<String> = PATTERNS
        .iter()
        .filter(|(t, _, _)| *t == tier)
        .map(|(_, _, source)| format!("/{}/i", source.replace('/', "\\/")))
        .collect();
    format!("[{}]", items.join(","))
}

/// Client-side bootstrap: repeats the classification in the browser and
/// injects the SPA module entry only for human visitors.
pub fn bootstrap_script(entry_script: &str) -> String {
    let entry = serde_json::to_string(entry_script).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        concat!(
            "(function(){{",
            "var ua=navigator.userAgent||'';",
            "var browser={browser};var spoofing={spoofing};var crawler={crawler};var social={social};",
            "function any(list){{for(var i=0;i<list.length;i++){{if(list[i].test(ua))return true;}}return false;}}",
            "var bot=any(browser)?any(spoofing):any(crawler);",
            "if(any(social))bot=true;",
            "if(bot){{document.documentElement.setAttribute('data-prerendered-for','bot');return;}}",
            "var s=document.createElement('script');s.type='module';s.src={entry};",
            "document.body.appendChild(s);",
            "}})();"
        ),
        browser = js_regex_list(Tier::Browser),
        spoofing = js_regex_list(Tier::SpoofingBot),
        crawler = js_regex_list(Tier::Crawler),
        social = js_regex_list(Tier::SocialPreview),
        entry = entry,
    )
}
