use super::Config;
use crate::foundation::Extent2D;
use crate::window::{CornerPreference, WindowFlags};
use serde::{Deserialize, Serialize};

/// Manager-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// DPI reported for windows whose monitor DPI cannot be queried
    pub default_dpi: f32,
    /// Corner rounding for windows that do not ask for their own
    pub corner_preference: CornerPreference,
    /// Initial capacity of the event queue
    pub event_queue_capacity: usize,
    /// Native window class name registered by the Win32 backend
    pub window_class_name: String,
    /// Drop a window's queued events when it is destroyed
    pub purge_events_on_destroy: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_dpi: 96.0,
            corner_preference: CornerPreference::Round,
            event_queue_capacity: 256,
            window_class_name: "Default Window Class".to_string(),
            purge_events_on_destroy: true,
        }
    }
}

impl Config for ManagerConfig {}

/// A window described in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowDescriptor {
    /// Title bar text
    pub title: String,
    /// Requested width in pixels
    pub width: u32,
    /// Requested height in pixels
    pub height: u32,
    /// Creation flags
    pub flags: WindowFlags,
    /// Corner rounding; the manager default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corners: Option<CornerPreference>,
}

impl WindowDescriptor {
    /// Descriptor for a visible, resizable window
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            ..Self::default()
        }
    }

    /// Requested size
    pub const fn size(&self) -> Extent2D {
        Extent2D::new(self.width, self.height)
    }
}

impl Default for WindowDescriptor {
    fn default() -> Self {
        Self {
            title: "Window".to_string(),
            width: 800,
            height: 600,
            flags: WindowFlags::VISIBLE | WindowFlags::RESIZABLE,
            corners: None,
        }
    }
}

impl Config for WindowDescriptor {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_manager_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.default_dpi, 96.0);
        assert_eq!(config.corner_preference, CornerPreference::Round);
        assert_eq!(config.event_queue_capacity, 256);
        assert!(config.purge_events_on_destroy);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ManagerConfig::load_from_str("event_queue_capacity = 8\n", ConfigFormat::Toml).unwrap();
        assert_eq!(config.event_queue_capacity, 8);
        assert_eq!(config.default_dpi, 96.0);
        assert_eq!(config.window_class_name, "Default Window Class");
    }

    #[test]
    fn test_descriptor_from_ron() {
        let text = r#"(
            title: "Tool palette",
            width: 320,
            height: 200,
            flags: "FRAMELESS | FLOATING | VISIBLE",
            corners: Some(RoundSmall),
        )"#;
        let descriptor = WindowDescriptor::load_from_str(text, ConfigFormat::Ron).unwrap();
        assert_eq!(descriptor.title, "Tool palette");
        assert_eq!(descriptor.size(), Extent2D::new(320, 200));
        assert_eq!(
            descriptor.flags,
            WindowFlags::FRAMELESS | WindowFlags::FLOATING | WindowFlags::VISIBLE
        );
        assert_eq!(descriptor.corners, Some(CornerPreference::RoundSmall));
    }

    #[test]
    fn test_descriptor_toml_round_trip() {
        let mut descriptor = WindowDescriptor::new("Main", 1280, 720);
        descriptor.flags |= WindowFlags::DRAG_AND_DROP;
        let text = descriptor.save_to_string(ConfigFormat::Toml).unwrap();
        assert!(text.contains("title = \"Main\""));
        assert!(!text.contains("corners"));
        let loaded = WindowDescriptor::load_from_str(&text, ConfigFormat::Toml).unwrap();
        assert_eq!(loaded, descriptor);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            WindowDescriptor::load_from_str("width = \"wide\"", ConfigFormat::Toml),
            Err(crate::config::ConfigError::Parse(_))
        ));
    }
}
