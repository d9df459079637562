//! Per-channel site constants.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::ConfigError;

/// The broadcaster sites sharing one catalog layout and one login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// vier.be
    #[default]
    Vier,
    /// vijf.be
    Vijf,
    /// zestv.be
    Zes,
}

impl Channel {
    /// Returns the short channel code used in config and on the command line.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Vier => "vier",
            Self::Vijf => "vijf",
            Self::Zes => "zes",
        }
    }

    /// Returns the site constants for this channel.
    #[must_use]
    pub fn config(self) -> ChannelConfig {
        let (base_url, no_image) = match self {
            Self::Vier => ("https://www.vier.be", "vierimage.png"),
            Self::Vijf => ("https://www.vijf.be", "vijfimage.png"),
            Self::Zes => ("https://www.zestv.be", "zesimage.png"),
        };
        ChannelConfig {
            channel: self,
            base_url: base_url.to_string(),
            main_list_url: format!("{base_url}/programmas"),
            no_image: no_image.to_string(),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Channel {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "vier" | "vierbe" => Ok(Self::Vier),
            "vijf" | "vijfbe" => Ok(Self::Vijf),
            "zes" | "zesbe" => Ok(Self::Zes),
            other => Err(ConfigError::invalid_value(
                "channel",
                other,
                "one of: vier, vijf, zes",
            )),
        }
    }
}

/// Site constants consumed by the listing walker and stream resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Which channel these constants belong to.
    pub channel: Channel,
    /// Site origin; relative entry URLs are joined against it.
    pub base_url: String,
    /// Program overview page where listing starts.
    pub main_list_url: String,
    /// Placeholder thumbnail name for entries without artwork.
    pub no_image: String,
}

impl ChannelConfig {
    /// Overrides the site origin (and the main list URL derived from it).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        self.main_list_url = format!("{base_url}/programmas");
        self.base_url = base_url;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_constants() {
        let vier = Channel::Vier.config();
        assert_eq!(vier.main_list_url, "https://www.vier.be/programmas");
        assert_eq!(vier.no_image, "vierimage.png");

        let zes = Channel::Zes.config();
        assert_eq!(zes.base_url, "https://www.zestv.be");
        assert_eq!(zes.no_image, "zesimage.png");

        assert_eq!(Channel::Vijf.config().no_image, "vijfimage.png");
    }

    #[test]
    fn test_channel_from_str_accepts_codes() {
        assert_eq!("vier".parse::<Channel>().unwrap(), Channel::Vier);
        assert_eq!(" VIJF ".parse::<Channel>().unwrap(), Channel::Vijf);
        assert_eq!("zesbe".parse::<Channel>().unwrap(), Channel::Zes);
        assert!("een".parse::<Channel>().is_err());
    }

    #[test]
    fn test_with_base_url_rebuilds_main_list() {
        let config = Channel::Vier.config().with_base_url("http://127.0.0.1:8080/");
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.main_list_url, "http://127.0.0.1:8080/programmas");
        assert_eq!(config.no_image, "vierimage.png");
    }
}
