//! Okrug abbreviations for compact table output
//! Maps the full OSM `local_name` of each Moscow okrug to its common acronym

use std::collections::HashMap;
use std::sync::LazyLock;

/// Okrug full name -> acronym
pub static OKRUG_ABBREVIATIONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // Historic city
    m.insert("Центральный административный округ", "ЦАО");
    m.insert("Северный административный округ", "САО");
    m.insert("Северо-Восточный административный округ", "СВАО");
    m.insert("Восточный административный округ", "ВАО");
    m.insert("Юго-Восточный административный округ", "ЮВАО");
    m.insert("Южный административный округ", "ЮАО");
    m.insert("Юго-Западный административный округ", "ЮЗАО");
    m.insert("Западный административный округ", "ЗАО");
    m.insert("Северо-Западный административный округ", "СЗАО");

    // Exclaves and New Moscow
    m.insert("Зеленоградский административный округ", "ЗелАО");
    m.insert("Новомосковский административный округ", "НАО");
    m.insert("Троицкий административный округ", "ТАО");

    m
});

/// Acronym for an okrug, falling back to the name itself
pub fn okrug_abbreviation(name: &str) -> String {
    OKRUG_ABBREVIATIONS
        .get(name.trim())
        .map(|s| s.to_string())
        .unwrap_or_else(|| name.trim().to_string())
}

/// Area name cut to `max_len` characters (not bytes) for table columns
pub fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }
    let kept: String = name.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_okrug() {
        assert_eq!(okrug_abbreviation("Центральный административный округ"), "ЦАО");
        assert_eq!(okrug_abbreviation(" Троицкий административный округ "), "ТАО");
    }

    #[test]
    fn test_unknown_okrug() {
        assert_eq!(okrug_abbreviation("Some Okrug"), "Some Okrug");
    }

    #[test]
    fn test_truncate_cyrillic() {
        assert_eq!(truncate_name("Хамовники", 20), "Хамовники");
        assert_eq!(truncate_name("Северное Медведково", 10), "Северно...");
    }
}
