use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the host can do with a finished download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    /// Shared media gallery, behind a runtime permission
    #[serde(rename = "gallery")]
    GalleryCapable,
    /// Native share interface
    #[serde(rename = "share")]
    ShareCapable,
    /// Neither; the path is reported to the user
    #[serde(rename = "generic")]
    Generic,
}

impl Platform {
    /// Capability of the build target
    pub fn detect() -> Self {
        if cfg!(target_os = "android") {
            Platform::GalleryCapable
        } else if cfg!(any(target_os = "ios", target_os = "macos")) {
            Platform::ShareCapable
        } else {
            Platform::Generic
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::GalleryCapable => write!(f, "gallery"),
            Platform::ShareCapable => write!(f, "share"),
            Platform::Generic => write!(f, "generic"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gallery" => Ok(Platform::GalleryCapable),
            "share" => Ok(Platform::ShareCapable),
            "generic" => Ok(Platform::Generic),
            other => Err(format!(
                "unknown platform {other:?} (expected gallery, share or generic)"
            )),
        }
    }
}

/// Answer to a gallery write-permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryPermission {
    Granted,
    Denied,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_round_trips_through_display() {
        for platform in [
            Platform::GalleryCapable,
            Platform::ShareCapable,
            Platform::Generic,
        ] {
            assert_eq!(platform.to_string().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn unknown_platform_is_rejected() {
        assert!("android".parse::<Platform>().is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_is_generic() {
        assert_eq!(Platform::detect(), Platform::Generic);
    }
}
