/// Trims and collapses inner whitespace (including non-breaking spaces).
pub fn clean_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Institution and counterparty names are compared upper-cased.
pub fn normalize_institution(value: &str) -> String {
    clean_text(value).to_uppercase()
}

pub fn normalize_email(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean_text("  Línea \u{a0} Capital\tTrabajo "), "Línea Capital Trabajo");
    }

    #[test]
    fn institution_is_upper_cased() {
        assert_eq!(normalize_institution(" banco  unión "), "BANCO UNIÓN");
    }

    #[test]
    fn email_is_lower_cased() {
        assert_eq!(normalize_email(" Ana.Perez@IFI.bo "), "ana.perez@ifi.bo");
    }
}
