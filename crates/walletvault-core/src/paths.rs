use uuid::Uuid;

const SEPARATOR: char = '/';

/// Maps wallet and account identifiers to backend keys.
///
/// Wallet headers live at `<prefix>/<wallet-id>` and accounts at
/// `<prefix>/<wallet-id>/<account-id>`. Without a prefix the leading segment is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathDeriver {
    prefix: Option<String>,
}

impl PathDeriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespace every key under `prefix`. Surrounding separators are ignored and an
    /// empty prefix is the same as none.
    pub fn with_prefix(prefix: impl AsRef<str>) -> Self {
        let trimmed = prefix.as_ref().trim_matches(SEPARATOR);
        Self {
            prefix: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Prefix under which every wallet header is listed (`""` or `"<prefix>/"`).
    pub fn wallets_root(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{SEPARATOR}"),
            None => String::new(),
        }
    }

    pub fn wallet_path(&self, wallet_id: Uuid) -> String {
        format!("{}{}", self.wallets_root(), wallet_id.hyphenated())
    }

    /// Prefix under which the accounts of `wallet_id` are listed.
    pub fn wallet_namespace(&self, wallet_id: Uuid) -> String {
        format!("{}{SEPARATOR}", self.wallet_path(wallet_id))
    }

    pub fn account_path(&self, wallet_id: Uuid, account_id: Uuid) -> String {
        format!(
            "{}{}",
            self.wallet_namespace(wallet_id),
            account_id.hyphenated()
        )
    }
}

/// Directory markers and other keys that never hold a record.
pub fn is_directory_marker(key: &str) -> bool {
    key.is_empty() || key.ends_with(SEPARATOR)
}

/// Returns the part of `key` below `prefix` when it is a direct child leaf.
pub fn direct_child<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    let rest = key.strip_prefix(prefix)?;
    if rest.is_empty() || rest.contains(SEPARATOR) {
        return None;
    }
    Some(rest)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn paths_are_pairwise_distinct() {
        let deriver = PathDeriver::new();
        let wallets = ids(4);
        let accounts = ids(4);

        let mut seen = HashSet::new();
        for w in &wallets {
            assert!(seen.insert(deriver.wallet_path(*w)));
        }
        for w in &wallets {
            for a in &accounts {
                assert!(seen.insert(deriver.account_path(*w, *a)));
            }
        }
        assert_eq!(seen.len(), wallets.len() + wallets.len() * accounts.len());
    }

    #[test]
    fn account_path_nests_under_wallet_namespace() {
        let deriver = PathDeriver::with_prefix("wallets");
        let wallet = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
        let account = Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap();

        assert_eq!(
            deriver.wallet_path(wallet),
            "wallets/11111111-1111-1111-1111-111111111111"
        );
        assert_eq!(
            deriver.account_path(wallet, account),
            "wallets/11111111-1111-1111-1111-111111111111/22222222-2222-2222-2222-222222222222"
        );
        let namespace = deriver.wallet_namespace(wallet);
        assert_eq!(
            direct_child(&namespace, &deriver.account_path(wallet, account)),
            Some("22222222-2222-2222-2222-222222222222")
        );
        assert_eq!(direct_child(&namespace, &deriver.wallet_path(wallet)), None);
    }

    #[test]
    fn prefix_is_normalised() {
        assert_eq!(PathDeriver::with_prefix("/vault/"), PathDeriver::with_prefix("vault"));
        assert_eq!(PathDeriver::with_prefix(""), PathDeriver::new());
        assert_eq!(PathDeriver::new().wallets_root(), "");
    }

    #[test]
    fn direct_child_rejects_nested_and_markers() {
        assert_eq!(direct_child("a/", "a/b/c"), None);
        assert_eq!(direct_child("a/", "a/"), None);
        assert_eq!(direct_child("a/", "b/c"), None);
        assert!(is_directory_marker("a/b/"));
        assert!(!is_directory_marker("a/b"));
    }
}
