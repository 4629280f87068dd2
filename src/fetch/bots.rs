//! Bot author detection

const KNOWN_BOTS: &[&str] = &[
    "dependabot",
    "renovate",
    "github-actions",
    "codecov",
    "greenkeeper",
    "snyk-bot",
    "mergify",
    "stale",
    "allcontributors",
    "imgbot",
    "semantic-release-bot",
    "renovate-bot",
    "dependabot-preview",
];

/// Authors named `*[bot]` or matching a well-known automation account.
pub fn is_bot_author(name: &str) -> bool {
    let name = name.trim().to_ascii_lowercase();
    name.ends_with("[bot]") || KNOWN_BOTS.contains(&name.as_str())
}
