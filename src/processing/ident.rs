use crate::model::ProcessingConfig;

/// Lowercase hex rendering of the channel number, used in service references.
#[inline]
pub fn hex_service_id(numeric_id: u32) -> String {
    format!("{numeric_id:x}")
}

/// Derives a deterministic 4-hex-digit transponder id from the provider
/// display name. Repeated runs with the same name yield the same tag, so
/// regeneration never orphans artifacts under a different tag.
pub fn derive_provider_tag(provider_name: &str) -> String {
    let hash = blake3::hash(provider_name.as_bytes());
    hex::encode(&hash.as_bytes()[..2])
}

pub fn resolve_provider_tag(cfg: &ProcessingConfig) -> String {
    cfg.tid
        .as_ref()
        .map_or_else(|| derive_provider_tag(&cfg.provider_name), |tid| tid.to_lowercase())
}

/// Receiver picon naming convention, composed from the service reference
/// fields and upper-cased as a whole.
pub fn picon_filename(service_type: u32, hex_service_id: &str, tag: &str) -> String {
    format!("{service_type}_0_1_{hex_service_id}_{tag}_0_0_0_0_0").to_uppercase() + ".png"
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hex_service_id_is_lowercase() {
        assert_eq!(hex_service_id(10), "a");
        assert_eq!(hex_service_id(255), "ff");
        assert_eq!(hex_service_id(4660), "1234");
    }

    #[test]
    fn test_hex_service_id_is_idempotent() {
        assert_eq!(hex_service_id(42), hex_service_id(42));
    }

    #[test]
    fn test_provider_tag_is_deterministic() {
        let first = derive_provider_tag("PlutoTV");
        let second = derive_provider_tag("PlutoTV");
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }

    #[test]
    fn test_provider_tag_differs_per_provider() {
        assert_ne!(derive_provider_tag("PlutoTV"), derive_provider_tag("SamsungTVPlus"));
    }

    #[test]
    fn test_picon_filename_composition() {
        assert_eq!(picon_filename(4097, "9b", "a1f0"), "4097_0_1_9B_A1F0_0_0_0_0_0.png");
    }
}
