//! Customer identifier masking for log output.

/// Mask a customer identifier for logging.
///
/// Reveals only the first and last two characters; identifiers of four
/// characters or fewer are fully masked. Log lines must never carry the
/// raw customer id.
pub fn mask_customer_id(customer_id: &str) -> String {
    let chars: Vec<char> = customer_id.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }

    let mut masked = String::with_capacity(chars.len());
    masked.extend(&chars[..2]);
    masked.extend(std::iter::repeat('*').take(chars.len() - 4));
    masked.extend(&chars[chars.len() - 2..]);
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_typical_id() {
        assert_eq!(mask_customer_id("CUST123456"), "CU******56");
    }

    #[test]
    fn test_mask_short_id_fully() {
        assert_eq!(mask_customer_id("abcd"), "****");
        assert_eq!(mask_customer_id("ab"), "**");
    }

    #[test]
    fn test_mask_empty() {
        assert_eq!(mask_customer_id(""), "");
    }

    #[test]
    fn test_mask_five_chars() {
        assert_eq!(mask_customer_id("abcde"), "ab*de");
    }
}
