pub const SENDER_TOKEN: &str = "%sender%";
pub const REGION_TOKEN: &str = "%region%";
pub const DIMENSION_TOKEN: &str = "%dimension%";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    pub sender: String,
    pub region: String,
    pub dimension: String,
}

impl Placeholders {
    pub fn render(&self, line: &str) -> String {
        line.replace(SENDER_TOKEN, &self.sender)
            .replace(REGION_TOKEN, &self.region)
            .replace(DIMENSION_TOKEN, &self.dimension)
    }

    pub fn render_lines(&self, lines: &[String]) -> Vec<String> {
        lines.iter().map(|line| self.render(line)).collect()
    }
}

pub fn mentions_region(lines: &[String]) -> bool {
    lines.iter().any(|line| line.contains(REGION_TOKEN))
}

pub fn mentions_dimension(lines: &[String]) -> bool {
    lines.iter().any(|line| line.contains(DIMENSION_TOKEN))
}

/// Whether a remote answer is still a stand-in rather than real data.
pub fn is_placeholder_value(value: &str, loading_text: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || value.eq_ignore_ascii_case(loading_text.trim())
        || value.eq_ignore_ascii_case("loading...")
        || value.eq_ignore_ascii_case("unknown")
}

#[cfg(test)]
mod tests {
    use super::{is_placeholder_value, mentions_dimension, mentions_region, Placeholders};

    fn placeholders() -> Placeholders {
        Placeholders {
            sender: "Alex".to_owned(),
            region: "Orange".to_owned(),
            dimension: "world_nether".to_owned(),
        }
    }

    #[test]
    fn substitutes_every_token_on_each_line_independently() {
        let lines = vec![
            "%sender% is on %region%".to_owned(),
            "World: %dimension% (%dimension%)".to_owned(),
            "plain".to_owned(),
        ];

        assert_eq!(
            placeholders().render_lines(&lines),
            vec![
                "Alex is on Orange".to_owned(),
                "World: world_nether (world_nether)".to_owned(),
                "plain".to_owned(),
            ]
        );
    }

    #[test]
    fn detects_enrichment_tokens() {
        let lines = vec!["Server: %region%".to_owned()];
        assert!(mentions_region(&lines));
        assert!(!mentions_dimension(&lines));
    }

    #[test]
    fn placeholder_values_are_recognized() {
        assert!(is_placeholder_value("", "Loading..."));
        assert!(is_placeholder_value(" loading... ", "Loading..."));
        assert!(is_placeholder_value("UNKNOWN", "Loading..."));
        assert!(is_placeholder_value("Fetching", "Fetching"));
        assert!(!is_placeholder_value("Orange", "Loading..."));
    }
}
