//! Test doubles shared by the unit tests.

use crate::output::{ConfigurationId, Fixed, HeadId, ModeId, PhysicalSize, Position};
use crate::registry::{HeadAttribute, ModeAttribute, OutputRegistry};
use crate::traits::{HeadChange, ObjectRelease, OutputConfigurator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    Mode(ModeId),
    Head(HeadId),
}

/// Records every handle release, in order.
#[derive(Debug, Default)]
pub struct ReleaseLog {
    pub released: Vec<Released>,
}

impl ObjectRelease for ReleaseLog {
    fn release_mode(&mut self, mode: ModeId) {
        self.released.push(Released::Mode(mode));
    }

    fn release_head(&mut self, head: HeadId) {
        self.released.push(Released::Head(head));
    }
}

/// One request a [`RecordingConfigurator`] received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Create(u32),
    Enable(ConfigurationId, HeadId),
    Disable(ConfigurationId, HeadId),
    Configure(ConfigurationId, HeadId, HeadChange),
    Apply(ConfigurationId),
    Destroy(ConfigurationId),
}

#[derive(Debug, thiserror::Error)]
#[error("mock transport refused {0}")]
pub struct MockTransportError(pub &'static str);

/// A configurator that records every request and never talks to a
/// compositor.  Outcomes are delivered by the test itself.
#[derive(Debug, Default)]
pub struct RecordingConfigurator {
    pub requests: Vec<Request>,
    pub releases: ReleaseLog,
    /// Name of a request kind (`"create"`, `"enable"`, `"configure"`,
    /// `"apply"`) that should fail.
    pub fail_on: Option<&'static str>,
    next_id: u32,
}

impl RecordingConfigurator {
    /// A configurator whose `kind` requests always fail.
    pub fn failing(kind: &'static str) -> Self {
        Self {
            fail_on: Some(kind),
            ..Self::default()
        }
    }

    fn check(&self, kind: &'static str) -> Result<(), MockTransportError> {
        match self.fail_on {
            Some(k) if k == kind => Err(MockTransportError(kind)),
            _ => Ok(()),
        }
    }

    pub fn configured_changes(&self) -> Vec<HeadChange> {
        self.requests
            .iter()
            .filter_map(|r| match r {
                Request::Configure(_, _, change) => Some(*change),
                _ => None,
            })
            .collect()
    }
}

impl OutputConfigurator for RecordingConfigurator {
    type Error = MockTransportError;

    fn create_configuration(&mut self, serial: u32) -> Result<ConfigurationId, MockTransportError> {
        self.check("create")?;
        self.next_id += 1;
        self.requests.push(Request::Create(serial));
        Ok(ConfigurationId(100 + self.next_id))
    }

    fn enable_head(&mut self, config: ConfigurationId, head: HeadId) -> Result<(), MockTransportError> {
        self.check("enable")?;
        self.requests.push(Request::Enable(config, head));
        Ok(())
    }

    fn disable_head(&mut self, config: ConfigurationId, head: HeadId) -> Result<(), MockTransportError> {
        self.check("disable")?;
        self.requests.push(Request::Disable(config, head));
        Ok(())
    }

    fn configure_head(
        &mut self,
        config: ConfigurationId,
        head: HeadId,
        change: HeadChange,
    ) -> Result<(), MockTransportError> {
        self.check("configure")?;
        self.requests.push(Request::Configure(config, head, change));
        Ok(())
    }

    fn apply(&mut self, config: ConfigurationId) -> Result<(), MockTransportError> {
        self.check("apply")?;
        self.requests.push(Request::Apply(config));
        Ok(())
    }

    fn destroy_configuration(&mut self, config: ConfigurationId) {
        self.requests.push(Request::Destroy(config));
    }
}

impl ObjectRelease for RecordingConfigurator {
    fn release_mode(&mut self, mode: ModeId) {
        self.releases.release_mode(mode);
    }

    fn release_head(&mut self, head: HeadId) {
        self.releases.release_head(head);
    }
}

pub const EDP: HeadId = HeadId(1);
pub const HDMI: HeadId = HeadId(2);
pub const EDP_1080P: ModeId = ModeId(10);
pub const EDP_720P: ModeId = ModeId(11);
pub const HDMI_2160P: ModeId = ModeId(20);

/// Two heads after one complete snapshot (serial 1):
///
/// * `eDP-1`, enabled, modes 1920x1080@60000 (current + preferred) and
///   1280x720@60000.
/// * `HDMI-A-1`, disabled, mode 3840x2160@30000.
pub fn sample_registry() -> OutputRegistry {
    let mut r = OutputRegistry::new();
    let mut releases = ReleaseLog::default();

    r.on_head_announced(EDP, &mut releases);
    r.on_head_attribute(EDP, HeadAttribute::Name("eDP-1".into()));
    r.on_head_attribute(EDP, HeadAttribute::Description("Built-in display".into()));
    r.on_head_attribute(
        EDP,
        HeadAttribute::PhysicalSize(PhysicalSize { width: 310, height: 170 }),
    );
    r.on_head_attribute(EDP, HeadAttribute::Enabled(true));
    r.on_head_attribute(EDP, HeadAttribute::Position(Position { x: 0, y: 0 }));
    r.on_head_attribute(EDP, HeadAttribute::Scale(Fixed::ONE));
    add_mode(&mut r, EDP, EDP_1080P, 1920, 1080, 60000);
    add_mode(&mut r, EDP, EDP_720P, 1280, 720, 60000);
    r.on_mode_preferred(EDP_1080P);
    r.on_current_mode_changed(EDP, EDP_1080P);

    r.on_head_announced(HDMI, &mut releases);
    r.on_head_attribute(HDMI, HeadAttribute::Name("HDMI-A-1".into()));
    r.on_head_attribute(HDMI, HeadAttribute::Enabled(false));
    add_mode(&mut r, HDMI, HDMI_2160P, 3840, 2160, 30000);

    r.on_snapshot_complete(1);
    r
}

fn add_mode(r: &mut OutputRegistry, head: HeadId, mode: ModeId, width: i32, height: i32, refresh: i32) {
    r.on_mode_announced(head, mode);
    r.on_mode_attribute(mode, ModeAttribute::Size { width, height });
    r.on_mode_attribute(mode, ModeAttribute::Refresh(refresh));
}
