use std::collections::HashMap;

use crate::error::ScaleError;


/// Maps the type names found in runtime metadata onto decodable shapes.
///
/// Metadata carries Rust source spellings (`T::AccountId`,
/// `Vec<BalanceOf<T>>`, `<T::Balance as HasCompact>::Type`). The registry
/// first strips the source-level noise, then applies chain specific aliases
/// until a name the decoder knows is reached.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    aliases: HashMap<String, String>,
}


impl TypeRegistry {
    /// Aliases shared by every chain this service indexes.
    pub fn base() -> Self {
        let mut registry = TypeRegistry::default();
        for (from, to) in [
            ("()", "Null"),
            ("Vec<u8>", "Bytes"),
            ("&[u8]", "Bytes"),
            ("&'static [u8]", "Bytes"),
            ("Text", "String"),
            ("BalanceOf", "Balance"),
            ("AuthorityId", "AccountId"),
            ("SessionKey", "AccountId"),
            ("ValidatorId", "AccountId"),
            ("KeyTypeId", "u32"),
            ("Index", "u32"),
            ("Nonce", "u32"),
            ("EraIndex", "u32"),
            ("SessionIndex", "u32"),
            ("MemberCount", "u32"),
            ("PropIndex", "u32"),
            ("ProposalIndex", "u32"),
            ("ReferendumIndex", "u32"),
            ("RegistrarIndex", "u32"),
            ("AuthorityIndex", "u32"),
            ("Perbill", "u32"),
            ("Permill", "u32"),
            ("Percent", "u8"),
            ("Gas", "u64"),
            ("Weight", "u64"),
            ("AuthorityWeight", "u64"),
            ("Hash", "H256"),
            ("CodeHash", "H256"),
            ("SeedOf", "H256"),
            ("VoteIndex", "u32"),
            ("LookupSource", "Address"),
            ("RawAddress", "Address"),
        ] {
            registry.aliases.insert(from.to_string(), to.to_string());
        }
        registry
    }

    /// A named registry bundled with the service.
    pub fn builtin(name: &str) -> Result<Self, ScaleError> {
        match name {
            "default" => Ok(Self::base()),
            "kusama" => {
                let mut registry = Self::base();
                registry.insert_alias("Keys", "(AccountId, AccountId, AccountId, AccountId, AccountId)");
                registry.insert_alias("DispatchInfo", "(u8, u8)");
                Ok(registry)
            }
            other => Err(ScaleError::invalid(format!(
                "unknown type registry `{other}`"
            ))),
        }
    }

    pub fn insert_alias(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.aliases.insert(from.into(), to.into());
    }

    /// Resolves a metadata type string to its decodable form.
    pub fn resolve(&self, ty: &str) -> String {
        let mut current = normalize_type(ty);
        // alias chains are short; the bound guards against cycles
        for _ in 0..8 {
            match self.aliases.get(&current) {
                Some(next) if *next != current => current = normalize_type(next),
                _ => break,
            }
        }
        current
    }
}


/// Strips Rust source syntax that carries no codec meaning.
fn normalize_type(ty: &str) -> String {
    let mut out = ty.trim().to_string();
    if let Some(inner) = out.strip_prefix("Box<").and_then(|s| s.strip_suffix('>')) {
        out = inner.trim().to_string();
    }
    // `<X as HasCompact>::Type` is how a compact field is spelled in source
    if let Some(inner) = out
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix(" as HasCompact>::Type"))
    {
        out = format!("Compact<{}>", inner.trim());
    }
    out = out.replace("<T as Trait>::", "");
    out = out.replace("<T as Config>::", "");
    out = out.replace("T::", "");
    out = out.replace("<T>", "");
    out.trim().to_string()
}


/// Splits a compound sub-type on top level commas only.
///
/// Commas nested inside angle brackets or parentheses stay with their
/// enclosing type, so `Vec<(u32, u32)>` is one sub-type, not two.
pub fn split_subtypes(sub_type: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in sub_type.chars() {
        match c {
            '<' | '(' => {
                depth += 1;
                current.push(c);
            }
            '>' | ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let last = current.trim();
    if !last.is_empty() {
        parts.push(last.to_string());
    }
    parts
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_noise_is_stripped() {
        let registry = TypeRegistry::base();
        assert_eq!(registry.resolve("T::AccountId"), "AccountId");
        assert_eq!(registry.resolve("<T as Trait>::Proposal"), "Proposal");
        assert_eq!(registry.resolve("Box<Proposal>"), "Proposal");
        assert_eq!(
            registry.resolve("<T::Balance as HasCompact>::Type"),
            "Compact<Balance>"
        );
    }

    #[test]
    fn aliases_chain_to_a_fixed_point() {
        let mut registry = TypeRegistry::base();
        registry.insert_alias("MomentOf", "Moment");
        assert_eq!(registry.resolve("T::BalanceOf"), "Balance");
        assert_eq!(registry.resolve("Vec<u8>"), "Bytes");
        assert_eq!(registry.resolve("MomentOf"), "Moment");
    }

    #[test]
    fn unknown_names_pass_through() {
        let registry = TypeRegistry::base();
        assert_eq!(registry.resolve("OpaqueTimeSlot"), "OpaqueTimeSlot");
    }

    #[test]
    fn split_respects_nesting() {
        assert_eq!(split_subtypes("u32, u64"), vec!["u32", "u64"]);
        assert_eq!(split_subtypes("Vec<(u32, u32)>"), vec!["Vec<(u32, u32)>"]);
        assert_eq!(
            split_subtypes("AccountId, Vec<(AccountId, Balance)>, u32"),
            vec!["AccountId", "Vec<(AccountId, Balance)>", "u32"]
        );
        assert_eq!(
            split_subtypes("(AccountId, Balance), (AccountId, Balance)"),
            vec!["(AccountId, Balance)", "(AccountId, Balance)"]
        );
    }
}
