use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Current UTC timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms, collision-free at back-office scale)
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Canonical dedup key for service names: trim, NFD, strip combining
/// marks (accents), lowercase.
///
/// "Cambio de Aceite", " cambio de aceite " and "cambió de aceite" all
/// collapse to `"cambio de aceite"`.
pub fn normalize_name(raw: &str) -> String {
    raw.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Canonical key for the access list: trimmed, lowercased email.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_case_and_accents() {
        assert_eq!(normalize_name("Cambio de Aceite"), "cambio de aceite");
        assert_eq!(normalize_name("  cambio de aceite "), "cambio de aceite");
        assert_eq!(normalize_name("Cambió de Aceite"), "cambio de aceite");
        assert_eq!(normalize_name("REPARACIÓN"), "reparacion");
        assert_eq!(normalize_name("Ñandú"), "nandu");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" Ana.Perez@Taller.bo "), "ana.perez@taller.bo");
    }

    #[test]
    fn test_snowflake_id_is_js_safe() {
        for _ in 0..100 {
            let id = snowflake_id();
            assert!(id > 0);
            assert!(id <= 2_i64.pow(53) - 1);
        }
    }
}
