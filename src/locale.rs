use crate::error::QueryError;

/// Language of the sentinel values and labels that end up inside group keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    ZhTw,
    En,
}

/// Sentinels substituted for missing record fields, plus the labels used when a tri-state field
/// or a play count is rendered into a group key or summary string.
#[derive(Debug, PartialEq, Eq)]
pub struct Labels {
    pub unknown_track: &'static str,
    pub unknown_artist: &'static str,
    pub unknown_album: &'static str,
    pub unknown_platform: &'static str,
    pub unknown_country: &'static str,
    pub unknown_uri: &'static str,
    pub unknown: &'static str,
    pub yes: &'static str,
    pub no: &'static str,
    /// Appended to a play count in trend summaries, e.g. `3次`.
    pub plays_suffix: &'static str,
}

static ZH_TW: Labels = Labels {
    unknown_track: "未知歌曲",
    unknown_artist: "未知歌手",
    unknown_album: "未知專輯",
    unknown_platform: "未知平台",
    unknown_country: "未知國家",
    unknown_uri: "未知URI",
    unknown: "未知",
    yes: "是",
    no: "否",
    plays_suffix: "次",
};

static EN: Labels = Labels {
    unknown_track: "Unknown Track",
    unknown_artist: "Unknown Artist",
    unknown_album: "Unknown Album",
    unknown_platform: "Unknown Platform",
    unknown_country: "Unknown Country",
    unknown_uri: "Unknown URI",
    unknown: "Unknown",
    yes: "Yes",
    no: "No",
    plays_suffix: "x",
};

impl Locale {
    pub fn labels(self) -> &'static Labels {
        match self {
            Self::ZhTw => &ZH_TW,
            Self::En => &EN,
        }
    }
}

impl Labels {
    /// Formats a play count the way trend summaries show it.
    pub fn plays(&self, count: u64) -> String {
        format!("{}{}", count, self.plays_suffix)
    }
}

impl std::str::FromStr for Locale {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "zh-tw" | "zh" => Ok(Self::ZhTw),
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            _ => Err(QueryError::InvalidLocale(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locale_names_loosely() {
        assert_eq!("zh_TW".parse::<Locale>().unwrap(), Locale::ZhTw);
        assert_eq!(" EN ".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn plays_uses_locale_suffix() {
        assert_eq!(Locale::ZhTw.labels().plays(3), "3次");
        assert_eq!(Locale::En.labels().plays(12), "12x");
    }
}
