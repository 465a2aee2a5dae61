//! Name validation for provider and notifier instances.

/// Whether `name` is usable as a provider or notifier instance name.
///
/// Names end up inside metric ids and storage keys, so they are restricted
/// to ASCII letters, digits, `_` and `-`.
pub fn is_valid_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
