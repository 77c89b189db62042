pub const PRODUCT_CATALOG: [&str; 39] = [
    "Workers",
    "Pages",
    "R2",
    "D1",
    "KV",
    "Durable Objects",
    "Queues",
    "Workers AI",
    "Vectorize",
    "AI Gateway",
    "Hyperdrive",
    "Browser Rendering",
    "Images",
    "Stream",
    "Calls",
    "Zero Trust",
    "Access",
    "Tunnel",
    "Gateway",
    "WARP",
    "WAF",
    "DDoS Protection",
    "Bot Management",
    "CDN",
    "DNS",
    "SSL/TLS",
    "Load Balancing",
    "Argo Smart Routing",
    "Spectrum",
    "Magic Transit",
    "Turnstile",
    "Email Routing",
    "Registrar",
    "Web Analytics",
    "Page Shield",
    "API Shield",
    "Rate Limiting",
    "Waiting Room",
    "Cache Reserve",
];

pub const ISSUE_TAXONOMY: [&str; 11] = [
    "Bug Report",
    "Feature Request",
    "Performance",
    "Security",
    "Billing",
    "Documentation",
    "Configuration",
    "Integration",
    "Outage",
    "Account Access",
    "General",
];

/// Issue label used when the model answers outside the taxonomy. Kept distinct
/// from the taxonomy's own `General` entry for wire compatibility.
pub const ISSUE_FALLBACK: &str = "General Question";

pub fn is_issue_label(value: &str) -> bool {
    ISSUE_TAXONOMY.contains(&value)
}

/// True when `segment` contains any catalog name, ignoring case.
pub fn mentions_product(segment: &str) -> bool {
    let lower = segment.to_lowercase();
    PRODUCT_CATALOG
        .iter()
        .any(|product| lower.contains(&product.to_lowercase()))
}
