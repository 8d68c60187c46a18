//! # Regulated-Substance Classifier
//!
//! Keyword screen over goods descriptions. A match means the goods line needs
//! a special-permit number even when the hazardous-material flag is not set:
//! the flag covers UN-classified hazmat, while this list covers substances
//! whose *transport* is permit-controlled (fuels, solvents, chemical
//! precursors, explosives).
//!
//! The list is deliberately small and lowercase-substring based. False
//! positives cost the user one extra field; false negatives cost a rejected
//! submission at the authority. The authority's own screen is stricter.

/// Substrings (lowercase, accent-insensitive forms included) that mark a
/// description as a regulated substance.
const REGULATED_KEYWORDS: &[&str] = &[
    "gasolina",
    "diesel",
    "diésel",
    "combustible",
    "solvente",
    "thinner",
    "explosivo",
    "pólvora",
    "polvora",
    "amoniaco",
    "amoníaco",
    "ácido sulfúrico",
    "acido sulfurico",
    "precursor químico",
    "precursor quimico",
];

/// Whether a goods description matches the regulated-substance screen.
pub fn is_regulated_substance(description: &str) -> bool {
    let lowered = description.to_lowercase();
    REGULATED_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}
