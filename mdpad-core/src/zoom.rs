//! Zoom preferences: integer percentages kept inside configurable bounds.

use crate::store::{EDITOR_ZOOM_KEY, PREVIEW_ZOOM_KEY, SHARED_ZOOM_KEY};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomBounds {
    pub min: i32,
    pub max: i32,
    pub step: i32,
    pub default: i32,
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self {
            min: 60,
            max: 160,
            step: 10,
            default: 100,
        }
    }
}

impl ZoomBounds {
    /// Build bounds, repairing inverted limits, a non-positive step and an
    /// out-of-range default.
    pub fn new(min: i32, max: i32, step: i32, default: i32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            step: step.max(1),
            default: default.clamp(min, max),
        }
    }

    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }

    /// One step from `current` in `direction`, clamped.
    pub fn step_from(&self, current: i32, direction: ZoomDirection) -> i32 {
        let current = self.clamp(current);
        let next = match direction {
            ZoomDirection::In => current.saturating_add(self.step),
            ZoomDirection::Out => current.saturating_sub(self.step),
        };
        self.clamp(next)
    }

    /// Interpret a stored value: missing or non-integer text gives the default,
    /// integers are clamped.
    pub fn parse(&self, raw: Option<&str>) -> i32 {
        raw.and_then(|s| s.trim().parse::<i32>().ok())
            .map(|v| self.clamp(v))
            .unwrap_or(self.default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomTarget {
    Editor,
    Preview,
}

impl ZoomTarget {
    /// Store key holding this pane's zoom.
    pub fn key(self, shared: bool) -> &'static str {
        match (shared, self) {
            (true, _) => SHARED_ZOOM_KEY,
            (false, ZoomTarget::Editor) => EDITOR_ZOOM_KEY,
            (false, ZoomTarget::Preview) => PREVIEW_ZOOM_KEY,
        }
    }
}

impl fmt::Display for ZoomTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoomTarget::Editor => write!(f, "editor"),
            ZoomTarget::Preview => write!(f, "preview"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Current zoom of both panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomLevels {
    pub editor: i32,
    pub preview: i32,
}

impl ZoomLevels {
    pub fn get(&self, target: ZoomTarget) -> i32 {
        match target {
            ZoomTarget::Editor => self.editor,
            ZoomTarget::Preview => self.preview,
        }
    }

    pub(crate) fn set(&mut self, target: ZoomTarget, value: i32) {
        match target {
            ZoomTarget::Editor => self.editor = value,
            ZoomTarget::Preview => self.preview = value,
        }
    }
}
