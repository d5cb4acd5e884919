use crate::severity::Severity;

/// ANSI SGR sequences used by the color maps
pub const DIM: &str = "\x1b[2m"; // Faint intensity
pub const NORMAL: &str = "\x1b[22m"; // Normal intensity
pub const BRIGHT: &str = "\x1b[1m"; // Bold intensity
pub const FG_YELLOW: &str = "\x1b[33m";
pub const FG_RED: &str = "\x1b[31m";
pub const FG_WHITE: &str = "\x1b[37m";
pub const BG_RED: &str = "\x1b[41m";
pub const RESET: &str = "\x1b[0m"; // Reset all attributes

/// Ordered (threshold, style) pairs. Lookup is first match wins, so entries
/// are expected in increasing threshold order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMap {
    styles: Vec<(Severity, String)>,
}

impl ColorMap {
    pub fn new<I, S>(styles: I) -> Self
    where
        I: IntoIterator<Item = (Severity, S)>,
        S: Into<String>,
    {
        Self {
            styles: styles.into_iter().map(|(l, s)| (l, s.into())).collect(),
        }
    }

    /// Whole-line ramp from dim debug to bright red critical
    pub fn dim_to_bright() -> Self {
        Self::new([
            (Severity::Debug, DIM.to_string()),
            (Severity::Info, NORMAL.to_string()),
            (Severity::Warning, format!("{}{}", NORMAL, FG_YELLOW)),
            (Severity::Error, format!("{}{}", NORMAL, FG_RED)),
            (Severity::Critical, format!("{}{}", BRIGHT, FG_RED)),
        ])
    }

    /// Level-name ramp that ends in white on a red background
    pub fn dim_to_back() -> Self {
        Self::new([
            (Severity::Debug, DIM.to_string()),
            (Severity::Info, BRIGHT.to_string()),
            (Severity::Warning, format!("{}{}", BRIGHT, FG_YELLOW)),
            (Severity::Error, format!("{}{}", BRIGHT, FG_RED)),
            (Severity::Critical, format!("{}{}{}", BRIGHT, FG_WHITE, BG_RED)),
        ])
    }

    /// Dim for debug, normal for everything else
    pub fn dim_or_normal() -> Self {
        Self::new([
            (Severity::Debug, DIM.to_string()),
            (Severity::Critical, NORMAL.to_string()),
        ])
    }

    pub fn color(&self, severity: Severity) -> &str {
        self.styles
            .iter()
            .find(|(threshold, _)| severity <= *threshold)
            .map(|(_, style)| style.as_str())
            .unwrap_or("")
    }

    pub fn colored(&self, severity: Severity, text: &str) -> String {
        format!("{}{}{}", self.color(severity), text, RESET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_threshold_at_or_above_wins() {
        let map = ColorMap::new([(Severity::Info, "a"), (Severity::Error, "b")]);
        assert_eq!(map.color(Severity::Debug), "a");
        assert_eq!(map.color(Severity::Info), "a");
        assert_eq!(map.color(Severity::Warning), "b");
        assert_eq!(map.color(Severity::Error), "b");
        assert_eq!(map.color(Severity::Critical), "");
    }

    #[test]
    fn test_empty_map_has_no_style() {
        let map = ColorMap::new(Vec::<(Severity, String)>::new());
        for severity in Severity::ALL {
            assert_eq!(map.color(severity), "");
            assert_eq!(map.colored(severity, "x"), format!("x{}", RESET));
        }
    }

    #[test]
    fn test_stored_order_is_respected() {
        // Out-of-order entries are scanned as given
        let map = ColorMap::new([(Severity::Critical, "late"), (Severity::Debug, "early")]);
        assert_eq!(map.color(Severity::Debug), "late");
    }

    #[test]
    fn test_canonical_maps_cover_every_severity() {
        for map in [
            ColorMap::dim_to_bright(),
            ColorMap::dim_to_back(),
            ColorMap::dim_or_normal(),
        ] {
            for severity in Severity::ALL {
                assert!(!map.color(severity).is_empty());
            }
        }
    }

    #[test]
    fn test_canonical_styles() {
        let bright = ColorMap::dim_to_bright();
        assert_eq!(bright.color(Severity::Debug), DIM);
        assert_eq!(bright.color(Severity::Warning), "\x1b[22m\x1b[33m");
        assert_eq!(bright.color(Severity::Critical), "\x1b[1m\x1b[31m");

        let back = ColorMap::dim_to_back();
        assert_eq!(back.color(Severity::Info), BRIGHT);
        assert_eq!(back.color(Severity::Critical), "\x1b[1m\x1b[37m\x1b[41m");

        let other = ColorMap::dim_or_normal();
        assert_eq!(other.color(Severity::Debug), DIM);
        assert_eq!(other.color(Severity::Info), NORMAL);
        assert_eq!(other.color(Severity::Critical), NORMAL);
    }

    #[test]
    fn test_colored_wraps_text() {
        let map = ColorMap::dim_to_bright();
        for severity in Severity::ALL {
            let out = map.colored(severity, "hello");
            assert!(out.starts_with(&format!("{}hello", map.color(severity))));
            assert!(out.ends_with(RESET));
        }
    }
}
