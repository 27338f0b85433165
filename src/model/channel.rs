/// One normalized playlist entry. Constructed and consumed within a single
/// pipeline iteration, nothing is retained across entries.
#[derive(Debug, Clone, Default)]
pub struct ChannelRecord {
    pub display_name: String,
    pub numeric_id: u32,
    pub hex_service_id: String,
    pub guide_id: String,
    pub logo_url: String,
    pub category_label: String,
    pub stream_url: String,
}

// The registry matches on the identifier fields only, the url token is a fixed
// placeholder.
const REGISTRY_URL_TOKEN: &str = "http%3a//stream";

impl ChannelRecord {
    pub fn to_service_line(&self, service_type: u32, tag: &str) -> String {
        // the bouquet line syntax uses ':' as field separator, so the url needs escaping
        let escaped_url = self.stream_url.replace(':', "%3a");
        format!(
            "#SERVICE {service_type}:0:1:{}:{tag}:0:0:0:0:0:{escaped_url}:{}",
            self.hex_service_id, self.display_name
        )
    }

    pub fn to_description_line(&self) -> String {
        format!("#DESCRIPTION {}", self.display_name)
    }

    pub fn to_registry_entry(&self, service_type: u32, tag: &str) -> String {
        format!(
            "\t<channel id=\"{}\">{service_type}:0:1:{}:{tag}:0:0:0:0:0:{REGISTRY_URL_TOKEN}</channel> <!-- {} -->",
            self.guide_id, self.hex_service_id, self.display_name
        )
    }
}
