//! Recipient masking for logs and failure reports

/// Mask the local part of an address, keeping its first character and the domain.
///
/// `alice@example.com` → `a****@example.com`. A one-character local part is
/// masked completely (`b@example.com` → `*@example.com`). Input without `@`
/// gets the same treatment as a local part.
pub fn mask_email(address: &str) -> String {
    let address = address.trim();
    let (local, domain) = match address.rsplit_once('@') {
        Some((local, domain)) => (local, Some(domain)),
        None => (address, None),
    };

    let len = local.chars().count();
    let masked = match local.chars().next() {
        Some(first) if len > 1 => format!("{}{}", first, "*".repeat(len - 1)),
        _ => "*".repeat(len),
    };

    match domain {
        Some(domain) => format!("{}@{}", masked, domain),
        None => masked,
    }
}

/// Mask every address and join them with `, `.
pub fn mask_recipients<S: AsRef<str>>(recipients: &[S]) -> String {
    recipients
        .iter()
        .map(|r| mask_email(r.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}
