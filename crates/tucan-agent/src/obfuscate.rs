//! Per-call category-name obfuscation for the finalizer.
//!
//! Category names are replaced with opaque `CAT000`-style tokens before they
//! reach the model, so the decision rests on descriptions and article content
//! rather than on familiar strings. The map lives for exactly one call.

/// Bijection between obfuscated tokens and real category names, assigned in
/// deterministic insertion order.
pub struct ObfuscationMap {
    // (token, real name) in assignment order.
    entries: Vec<(String, String)>,
}

impl ObfuscationMap {
    /// Obfuscate `existing` categories plus the proposed new one.
    ///
    /// Returns the map, the obfuscated existing list as `(token,
    /// description)` pairs, and the token assigned to the new category.
    pub fn build(
        existing: &[(String, String)],
        new_category: &str,
    ) -> (Self, Vec<(String, String)>, String) {
        let mut entries = Vec::with_capacity(existing.len() + 1);
        let mut obfuscated = Vec::with_capacity(existing.len());
        for (i, (name, description)) in existing.iter().enumerate() {
            let token = format!("CAT{i:03}");
            entries.push((token.clone(), name.clone()));
            obfuscated.push((token, description.clone()));
        }
        let new_token = format!("CAT{:03}", existing.len());
        entries.push((new_token.clone(), new_category.to_string()));
        (Self { entries }, obfuscated, new_token)
    }

    /// Real category name behind a token, if the token was issued here.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, real)| real.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
