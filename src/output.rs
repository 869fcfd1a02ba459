//! Output entities mirrored from the compositor.
//!
//! A [`Head`] is one output device (a monitor or a virtual display) and owns
//! the [`Mode`]s the compositor advertises for it.  Both are identified by
//! the protocol object id the transport assigned to them, wrapped in
//! [`HeadId`] / [`ModeId`] so the two can never be confused.
//!
//! Mode currency is never stored per mode.  A head records *which* mode is
//! current and each mode records whether it is preferred; the displayed
//! [`ModeStatus`] is derived from those two facts by [`derive_statuses`].

use std::fmt;

/// Protocol identity of a head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadId(pub u32);

/// Protocol identity of a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeId(pub u32);

/// Protocol identity of a configuration object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigurationId(pub u32);

impl fmt::Display for HeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "head#{}", self.0)
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mode#{}", self.0)
    }
}

impl fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration#{}", self.0)
    }
}

//  Value types

/// Signed 24.8 fixed-point number, the protocol's encoding for scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct Fixed(i32);

impl Fixed {
    pub const ONE: Fixed = Fixed(256);

    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Convert from a float, rounding to the nearest representable value.
    ///
    /// Returns `None` for non-finite input or values outside the 24.8 range.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * 256.0).round();
        if scaled < i32::MIN as f64 || scaled > i32::MAX as f64 {
            return None;
        }
        Some(Self(scaled as i32))
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 256.0
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.to_f64())
    }
}

/// Output transform, numbered as in `wl_output.transform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    Normal = 0,
    Rotate90 = 1,
    Rotate180 = 2,
    Rotate270 = 3,
    Flipped = 4,
    Flipped90 = 5,
    Flipped180 = 6,
    Flipped270 = 7,
}

impl TryFrom<u32> for Transform {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        Ok(match value {
            0 => Transform::Normal,
            1 => Transform::Rotate90,
            2 => Transform::Rotate180,
            3 => Transform::Rotate270,
            4 => Transform::Flipped,
            5 => Transform::Flipped90,
            6 => Transform::Flipped180,
            7 => Transform::Flipped270,
            other => return Err(other),
        })
    }
}

impl From<Transform> for u32 {
    fn from(t: Transform) -> u32 {
        t as u32
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Transform::Normal => "normal",
            Transform::Rotate90 => "90",
            Transform::Rotate180 => "180",
            Transform::Rotate270 => "270",
            Transform::Flipped => "flipped",
            Transform::Flipped90 => "flipped-90",
            Transform::Flipped180 => "flipped-180",
            Transform::Flipped270 => "flipped-270",
        };
        f.write_str(s)
    }
}

/// Position of a head in the global compositor space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Physical dimensions of a head in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhysicalSize {
    pub width: i32,
    pub height: i32,
}

/// A mode given by explicit numbers rather than picked from the head's list.
///
/// `refresh` is in mHz, as everywhere in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomMode {
    pub width: i32,
    pub height: i32,
    pub refresh: i32,
}

//  Modes

/// Display status of a mode, as shown by `list_outputs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeStatus {
    Normal,
    Current,
    Preferred,
    CurrentAndPreferred,
}

impl ModeStatus {
    pub fn from_flags(current: bool, preferred: bool) -> Self {
        match (current, preferred) {
            (true, true) => ModeStatus::CurrentAndPreferred,
            (true, false) => ModeStatus::Current,
            (false, true) => ModeStatus::Preferred,
            (false, false) => ModeStatus::Normal,
        }
    }

    pub fn is_current(self) -> bool {
        matches!(self, ModeStatus::Current | ModeStatus::CurrentAndPreferred)
    }
}

impl fmt::Display for ModeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModeStatus::Normal => "Normal",
            ModeStatus::Current => "Current",
            ModeStatus::Preferred => "Preferred",
            ModeStatus::CurrentAndPreferred => "Current+Preferred",
        };
        f.write_str(s)
    }
}

/// One advertised mode of a head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode {
    pub id: ModeId,
    pub width: i32,
    pub height: i32,
    /// Refresh rate in mHz.
    pub refresh: i32,
    pub preferred: bool,
}

impl Mode {
    pub fn new(id: ModeId) -> Self {
        Self {
            id,
            width: 0,
            height: 0,
            refresh: 0,
            preferred: false,
        }
    }

    /// Whether this mode has exactly the given `(width, height, refresh)`.
    pub fn matches(&self, width: i32, height: i32, refresh: i32) -> bool {
        self.width == width && self.height == height && self.refresh == refresh
    }
}

/// Derive the status of every mode in `modes` from the head's current mode
/// and each mode's preferred flag.
///
/// Exactly the mode whose id equals `current` carries a current status, so
/// the result never contains two current modes.
pub fn derive_statuses<'a>(
    current: Option<ModeId>,
    modes: impl IntoIterator<Item = &'a Mode>,
) -> Vec<(ModeId, ModeStatus)> {
    modes
        .into_iter()
        .map(|m| {
            (
                m.id,
                ModeStatus::from_flags(current == Some(m.id), m.preferred),
            )
        })
        .collect()
}

//  Heads

/// One output device as last reported by the compositor.
///
/// String attributes stay `None` until the compositor announces them.
#[derive(Debug, Clone, PartialEq)]
pub struct Head {
    pub id: HeadId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub physical_size: PhysicalSize,
    pub enabled: bool,
    pub position: Position,
    /// Raw `wl_output.transform` value as sent by the compositor.
    pub transform: u32,
    pub scale: Fixed,
    pub adaptive_sync: bool,
    pub current_mode: Option<ModeId>,
    pub modes: Vec<Mode>,
}

impl Head {
    pub fn new(id: HeadId) -> Self {
        Self {
            id,
            name: None,
            description: None,
            make: None,
            model: None,
            serial_number: None,
            physical_size: PhysicalSize::default(),
            enabled: false,
            position: Position::default(),
            transform: 0,
            scale: Fixed::default(),
            adaptive_sync: false,
            current_mode: None,
            modes: Vec::new(),
        }
    }

    pub fn mode(&self, id: ModeId) -> Option<&Mode> {
        self.modes.iter().find(|m| m.id == id)
    }

    pub fn mode_mut(&mut self, id: ModeId) -> Option<&mut Mode> {
        self.modes.iter_mut().find(|m| m.id == id)
    }

    /// Look up an advertised mode by its exact `(width, height, refresh)`.
    pub fn find_mode(&self, width: i32, height: i32, refresh: i32) -> Option<&Mode> {
        self.modes.iter().find(|m| m.matches(width, height, refresh))
    }

    pub fn mode_status(&self, mode: &Mode) -> ModeStatus {
        ModeStatus::from_flags(self.current_mode == Some(mode.id), mode.preferred)
    }

    pub fn statuses(&self) -> Vec<(ModeId, ModeStatus)> {
        derive_statuses(self.current_mode, &self.modes)
    }

    /// The name, or `"(unknown)"` while it has not been announced.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unknown)")
    }
}

/// Human-readable dump of a head and its modes, as printed by `list_outputs`.
impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or = |s: &Option<String>, fallback: &'static str| -> String {
            s.clone().unwrap_or_else(|| fallback.to_string())
        };
        writeln!(f, "Output: {}", self.display_name())?;
        writeln!(f, "  Description      : {}", or(&self.description, "(none)"))?;
        writeln!(f, "  Make             : {}", or(&self.make, "(unknown)"))?;
        writeln!(f, "  Model            : {}", or(&self.model, "(unknown)"))?;
        writeln!(f, "  Serial Number    : {}", or(&self.serial_number, "(unknown)"))?;
        writeln!(
            f,
            "  Physical Size    : {}mm x {}mm",
            self.physical_size.width, self.physical_size.height
        )?;
        writeln!(f, "  Enabled          : {}", if self.enabled { "Yes" } else { "No" })?;
        writeln!(f, "  Position         : ({}, {})", self.position.x, self.position.y)?;
        match Transform::try_from(self.transform) {
            Ok(t) => writeln!(f, "  Transform        : {} ({})", self.transform, t)?,
            Err(raw) => writeln!(f, "  Transform        : {}", raw)?,
        }
        writeln!(f, "  Scale Factor     : {}", self.scale)?;
        writeln!(
            f,
            "  Adaptive Sync    : {}",
            if self.adaptive_sync { "Enabled" } else { "Disabled" }
        )?;
        writeln!(f, "  Available Modes:")?;
        for mode in &self.modes {
            writeln!(
                f,
                "    {}x{} @ {:.3} Hz [{}]",
                mode.width,
                mode.height,
                mode.refresh as f64 / 1000.0,
                self.mode_status(mode)
            )?;
        }
        Ok(())
    }
}
