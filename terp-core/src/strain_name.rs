//! Strain name normalization
//!
//! One shared normalization used for database lookup keys and for API
//! query terms, so the same strain always resolves to the same key no
//! matter which path produced the name.

/// Product-type words stripped out of strain names before matching.
pub const STRAIN_NAME_SUFFIXES: [&str; 10] = [
    "flower",
    "bud",
    "strain",
    "cannabis",
    "indica",
    "sativa",
    "hybrid",
    "concentrate",
    "extract",
    "rosin",
];

/// Normalize a strain name into a lowercase lookup key: product-type
/// words removed, punctuation turned into spaces, whitespace collapsed.
pub fn normalize_strain_name(name: &str) -> String {
    let mut name = name.to_lowercase();

    for suffix in STRAIN_NAME_SUFFIXES {
        name = name
            .replace(&format!(" {suffix}"), "")
            .replace(&format!("{suffix} "), "");
    }

    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title Case variant used when querying external APIs that index strains
/// by display name ("blue dream" → "Blue Dream").
pub fn title_case_strain_name(name: &str) -> String {
    normalize_strain_name(name)
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
