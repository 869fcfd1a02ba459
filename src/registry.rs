//! The output registry: a live mirror of compositor-reported output state.
//!
//! [`OutputRegistry`] is an event sink.  The transport calls one method per
//! discovery event, in delivery order, and the registry applies it
//! immediately; nothing is buffered until the next `done`.  Only after
//! [`on_snapshot_complete`](OutputRegistry::on_snapshot_complete) should a
//! consumer treat the registry as a consistent point-in-time view.
//!
//! None of the methods fail.  Events naming an unknown head or mode are
//! logged and dropped; repeated events simply overwrite.

use crate::output::{Fixed, Head, HeadId, Mode, ModeId, PhysicalSize, Position};
use crate::traits::ObjectRelease;
use log::{debug, warn};

/// A head attribute announced by the compositor.
#[derive(Debug, Clone, PartialEq)]
pub enum HeadAttribute {
    Name(String),
    Description(String),
    Make(String),
    Model(String),
    SerialNumber(String),
    PhysicalSize(PhysicalSize),
    Enabled(bool),
    Position(Position),
    Transform(u32),
    Scale(Fixed),
    AdaptiveSync(bool),
}

/// A mode attribute announced by the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeAttribute {
    Size { width: i32, height: i32 },
    Refresh(i32),
}

/// Mapping from protocol identity to [`Head`]s, in discovery order.
#[derive(Debug, Default)]
pub struct OutputRegistry {
    heads: Vec<Head>,
    serial: Option<u32>,
    previous_serial: Option<u32>,
}

impl OutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    //  Queries

    /// Iterate over the heads as they are right now.
    ///
    /// The iterator borrows the registry, so it always reflects live state
    /// and can be restarted by calling `heads()` again.
    pub fn heads(&self) -> impl Iterator<Item = &Head> + '_ {
        self.heads.iter()
    }

    pub fn head(&self, id: HeadId) -> Option<&Head> {
        self.heads.iter().find(|h| h.id == id)
    }

    pub fn head_by_name(&self, name: &str) -> Option<&Head> {
        self.heads
            .iter()
            .find(|h| h.name.as_deref() == Some(name))
    }

    /// The head owning `mode`, if any.
    pub fn owner_of(&self, mode: ModeId) -> Option<&Head> {
        self.heads.iter().find(|h| h.mode(mode).is_some())
    }

    pub fn len(&self) -> usize {
        self.heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Serial of the most recent complete snapshot, `None` before the first.
    pub fn serial(&self) -> Option<u32> {
        self.serial
    }

    pub fn previous_serial(&self) -> Option<u32> {
        self.previous_serial
    }

    fn head_mut(&mut self, id: HeadId) -> Option<&mut Head> {
        self.heads.iter_mut().find(|h| h.id == id)
    }

    fn owner_of_mut(&mut self, mode: ModeId) -> Option<&mut Head> {
        self.heads.iter_mut().find(|h| h.mode(mode).is_some())
    }

    //  Head events

    /// A new head was announced.
    ///
    /// A repeated announcement for a live id frees the old entry, modes
    /// first, and appends a fresh head at the end of the discovery order.
    pub fn on_head_announced<R: ObjectRelease>(&mut self, id: HeadId, release: &mut R) {
        if let Some(index) = self.heads.iter().position(|h| h.id == id) {
            warn!("{} announced twice, replacing stale entry", id);
            self.free_head(index, release);
        }
        self.heads.push(Head::new(id));
        debug!("{} created", id);
    }

    pub fn on_head_attribute(&mut self, id: HeadId, attribute: HeadAttribute) {
        let Some(head) = self.head_mut(id) else {
            warn!("attribute {:?} for unknown {}", attribute, id);
            return;
        };
        match attribute {
            HeadAttribute::Name(name) => head.name = Some(name),
            HeadAttribute::Description(d) => head.description = Some(d),
            HeadAttribute::Make(make) => head.make = Some(make),
            HeadAttribute::Model(model) => head.model = Some(model),
            HeadAttribute::SerialNumber(s) => head.serial_number = Some(s),
            HeadAttribute::PhysicalSize(size) => head.physical_size = size,
            HeadAttribute::Enabled(enabled) => head.enabled = enabled,
            HeadAttribute::Position(pos) => head.position = pos,
            HeadAttribute::Transform(t) => head.transform = t,
            HeadAttribute::Scale(scale) => head.scale = scale,
            HeadAttribute::AdaptiveSync(on) => head.adaptive_sync = on,
        }
        debug!("{} updated", id);
    }

    /// The compositor removed a head.  Its modes are released first, then
    /// the head itself, and finally it leaves the registry.
    pub fn on_head_removed<R: ObjectRelease>(&mut self, id: HeadId, release: &mut R) {
        let Some(index) = self.heads.iter().position(|h| h.id == id) else {
            warn!("finished event for unknown {}", id);
            return;
        };
        self.free_head(index, release);
    }

    fn free_head<R: ObjectRelease>(&mut self, index: usize, release: &mut R) {
        let mut head = self.heads.remove(index);
        for mode in head.modes.drain(..) {
            release.release_mode(mode.id);
        }
        release.release_head(head.id);
        debug!("{} freed", head.id);
    }

    //  Mode events

    /// A head announced a new mode.
    ///
    /// If the mode already exists on that head (a `current_mode` reference
    /// outran its announcement) the existing entry is kept.
    pub fn on_mode_announced(&mut self, head: HeadId, mode: ModeId) {
        let Some(h) = self.head_mut(head) else {
            warn!("{} announced for unknown {}", mode, head);
            return;
        };
        if h.mode(mode).is_none() {
            h.modes.push(Mode::new(mode));
            debug!("{} created on {}", mode, head);
        }
    }

    pub fn on_mode_attribute(&mut self, mode: ModeId, attribute: ModeAttribute) {
        let Some(m) = self.owner_of_mut(mode).and_then(|h| h.mode_mut(mode)) else {
            warn!("attribute {:?} for unknown {}", attribute, mode);
            return;
        };
        match attribute {
            ModeAttribute::Size { width, height } => {
                m.width = width;
                m.height = height;
            }
            ModeAttribute::Refresh(refresh) => m.refresh = refresh,
        }
    }

    /// The head's current mode changed.
    ///
    /// Currency is held by the head, so setting it implicitly demotes the
    /// previous current mode.  A mode not seen yet is synthesized.
    pub fn on_current_mode_changed(&mut self, head: HeadId, mode: ModeId) {
        let Some(h) = self.head_mut(head) else {
            warn!("current mode {} for unknown {}", mode, head);
            return;
        };
        if h.mode(mode).is_none() {
            debug!("{} became current before being announced", mode);
            h.modes.push(Mode::new(mode));
        }
        h.current_mode = Some(mode);
    }

    pub fn on_mode_preferred(&mut self, mode: ModeId) {
        match self.owner_of_mut(mode).and_then(|h| h.mode_mut(mode)) {
            Some(m) => m.preferred = true,
            None => warn!("preferred event for unknown {}", mode),
        }
    }

    pub fn on_mode_removed<R: ObjectRelease>(&mut self, mode: ModeId, release: &mut R) {
        let Some(head) = self.owner_of_mut(mode) else {
            warn!("finished event for unknown {}", mode);
            return;
        };
        head.modes.retain(|m| m.id != mode);
        if head.current_mode == Some(mode) {
            head.current_mode = None;
        }
        release.release_mode(mode);
        debug!("{} freed", mode);
    }

    //  Manager events

    /// A batch of discovery events is complete.
    pub fn on_snapshot_complete(&mut self, serial: u32) {
        self.previous_serial = self.serial;
        self.serial = Some(serial);
        debug!("snapshot serial {} (previous {:?})", serial, self.previous_serial);
    }

    /// Destroy every head (and its modes), e.g. at shutdown.
    pub fn clear<R: ObjectRelease>(&mut self, release: &mut R) {
        let ids: Vec<HeadId> = self.heads.iter().map(|h| h.id).collect();
        for id in ids {
            self.on_head_removed(id, release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ModeStatus;
    use crate::testing::{Released, ReleaseLog};

    fn announce(r: &mut OutputRegistry, id: HeadId) {
        r.on_head_announced(id, &mut ReleaseLog::default());
    }

    fn registry_with_head() -> OutputRegistry {
        let mut r = OutputRegistry::new();
        announce(&mut r, HeadId(1));
        r.on_head_attribute(HeadId(1), HeadAttribute::Name("eDP-1".into()));
        r
    }

    fn status(r: &OutputRegistry, mode: u32) -> ModeStatus {
        let head = r.owner_of(ModeId(mode)).unwrap();
        head.mode_status(head.mode(ModeId(mode)).unwrap())
    }

    fn current_count(r: &OutputRegistry) -> usize {
        r.heads()
            .map(|h| h.statuses().iter().filter(|(_, s)| s.is_current()).count())
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn string_attributes_start_unset() {
        let r = registry_with_head();
        let head = r.head(HeadId(1)).unwrap();
        assert_eq!(head.make, None);
        assert_eq!(head.model, None);
        assert_eq!(head.serial_number, None);
        assert_eq!(head.description, None);
    }

    #[test]
    fn attributes_read_back_until_overwritten() {
        let mut r = registry_with_head();
        let id = HeadId(1);
        r.on_head_attribute(id, HeadAttribute::Description("Built-in".into()));
        r.on_head_attribute(id, HeadAttribute::Make("BOE".into()));
        r.on_head_attribute(id, HeadAttribute::Model("0x0BCA".into()));
        r.on_head_attribute(id, HeadAttribute::SerialNumber("X1".into()));
        r.on_head_attribute(
            id,
            HeadAttribute::PhysicalSize(PhysicalSize { width: 310, height: 170 }),
        );
        r.on_head_attribute(id, HeadAttribute::Enabled(true));
        r.on_head_attribute(id, HeadAttribute::Position(Position { x: 10, y: -20 }));
        r.on_head_attribute(id, HeadAttribute::Transform(3));
        r.on_head_attribute(id, HeadAttribute::Scale(Fixed::from_raw(384)));
        r.on_head_attribute(id, HeadAttribute::AdaptiveSync(true));

        let head = r.head(id).unwrap();
        assert_eq!(head.name.as_deref(), Some("eDP-1"));
        assert_eq!(head.description.as_deref(), Some("Built-in"));
        assert_eq!(head.make.as_deref(), Some("BOE"));
        assert_eq!(head.model.as_deref(), Some("0x0BCA"));
        assert_eq!(head.serial_number.as_deref(), Some("X1"));
        assert_eq!(head.physical_size, PhysicalSize { width: 310, height: 170 });
        assert!(head.enabled);
        assert_eq!(head.position, Position { x: 10, y: -20 });
        assert_eq!(head.transform, 3);
        assert_eq!(head.scale, Fixed::from_raw(384));
        assert!(head.adaptive_sync);

        r.on_head_attribute(id, HeadAttribute::Name("eDP-2".into()));
        r.on_head_attribute(id, HeadAttribute::Enabled(false));
        let head = r.head(id).unwrap();
        assert_eq!(head.name.as_deref(), Some("eDP-2"));
        assert!(!head.enabled);
        assert_eq!(head.make.as_deref(), Some("BOE"));
    }

    #[test]
    fn mode_attributes_apply_to_owner() {
        let mut r = registry_with_head();
        r.on_mode_announced(HeadId(1), ModeId(10));
        r.on_mode_attribute(ModeId(10), ModeAttribute::Size { width: 1920, height: 1080 });
        r.on_mode_attribute(ModeId(10), ModeAttribute::Refresh(60000));
        let head = r.head(HeadId(1)).unwrap();
        assert!(head.find_mode(1920, 1080, 60000).is_some());
        assert_eq!(r.owner_of(ModeId(10)).map(|h| h.id), Some(HeadId(1)));
    }

    #[test]
    fn current_change_demotes_previous_mode() {
        let mut r = registry_with_head();
        r.on_mode_announced(HeadId(1), ModeId(10));
        r.on_mode_announced(HeadId(1), ModeId(11));
        r.on_current_mode_changed(HeadId(1), ModeId(10));
        assert_eq!(status(&r, 10), ModeStatus::Current);

        r.on_current_mode_changed(HeadId(1), ModeId(11));
        assert_eq!(status(&r, 10), ModeStatus::Normal);
        assert_eq!(status(&r, 11), ModeStatus::Current);
    }

    #[test]
    fn current_and_preferred_demotes_to_preferred() {
        let mut r = registry_with_head();
        r.on_mode_announced(HeadId(1), ModeId(10));
        r.on_mode_announced(HeadId(1), ModeId(11));
        r.on_mode_preferred(ModeId(10));
        assert_eq!(status(&r, 10), ModeStatus::Preferred);

        r.on_current_mode_changed(HeadId(1), ModeId(10));
        assert_eq!(status(&r, 10), ModeStatus::CurrentAndPreferred);

        r.on_current_mode_changed(HeadId(1), ModeId(11));
        assert_eq!(status(&r, 10), ModeStatus::Preferred);
        assert_eq!(status(&r, 11), ModeStatus::Current);
    }

    #[test]
    fn preferred_after_current_combines() {
        let mut r = registry_with_head();
        r.on_mode_announced(HeadId(1), ModeId(10));
        r.on_current_mode_changed(HeadId(1), ModeId(10));
        r.on_mode_preferred(ModeId(10));
        assert_eq!(status(&r, 10), ModeStatus::CurrentAndPreferred);
    }

    #[test]
    fn out_of_order_current_mode_is_synthesized_then_reconciled() {
        let mut r = registry_with_head();
        r.on_current_mode_changed(HeadId(1), ModeId(42));
        assert_eq!(status(&r, 42), ModeStatus::Current);

        // The late announcement must not create a duplicate entry.
        r.on_mode_announced(HeadId(1), ModeId(42));
        r.on_mode_attribute(ModeId(42), ModeAttribute::Size { width: 800, height: 600 });
        let head = r.head(HeadId(1)).unwrap();
        assert_eq!(head.modes.len(), 1);
        assert_eq!(head.modes[0].width, 800);
        assert_eq!(status(&r, 42), ModeStatus::Current);
    }

    #[test]
    fn at_most_one_current_mode_per_head() {
        let mut r = registry_with_head();
        for id in 10..15 {
            r.on_mode_announced(HeadId(1), ModeId(id));
        }
        r.on_mode_preferred(ModeId(12));
        for id in [10, 12, 14, 11, 99, 12] {
            r.on_current_mode_changed(HeadId(1), ModeId(id));
            assert_eq!(current_count(&r), 1);
        }
        r.on_snapshot_complete(1);
        assert_eq!(current_count(&r), 1);
    }

    #[test]
    fn head_removal_releases_modes_before_head() {
        let mut r = registry_with_head();
        r.on_mode_announced(HeadId(1), ModeId(10));
        r.on_mode_announced(HeadId(1), ModeId(11));
        announce(&mut r, HeadId(2));

        let mut log = ReleaseLog::default();
        r.on_head_removed(HeadId(1), &mut log);

        assert_eq!(
            log.released,
            vec![
                Released::Mode(ModeId(10)),
                Released::Mode(ModeId(11)),
                Released::Head(HeadId(1)),
            ]
        );
        assert!(r.head(HeadId(1)).is_none());
        assert!(r.owner_of(ModeId(10)).is_none());
        assert!(r.owner_of(ModeId(11)).is_none());
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn mode_removal_clears_current_reference() {
        let mut r = registry_with_head();
        r.on_mode_announced(HeadId(1), ModeId(10));
        r.on_current_mode_changed(HeadId(1), ModeId(10));

        let mut log = ReleaseLog::default();
        r.on_mode_removed(ModeId(10), &mut log);

        let head = r.head(HeadId(1)).unwrap();
        assert!(head.modes.is_empty());
        assert_eq!(head.current_mode, None);
        assert_eq!(log.released, vec![Released::Mode(ModeId(10))]);
    }

    #[test]
    fn unknown_ids_are_tolerated() {
        let mut r = registry_with_head();
        let mut log = ReleaseLog::default();
        r.on_head_attribute(HeadId(9), HeadAttribute::Enabled(true));
        r.on_mode_announced(HeadId(9), ModeId(1));
        r.on_mode_preferred(ModeId(77));
        r.on_mode_removed(ModeId(77), &mut log);
        r.on_head_removed(HeadId(9), &mut log);
        assert!(log.released.is_empty());
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn duplicate_announcement_replaces_head() {
        let mut r = registry_with_head();
        announce(&mut r, HeadId(2));
        announce(&mut r, HeadId(1));
        let order: Vec<HeadId> = r.heads().map(|h| h.id).collect();
        assert_eq!(order, vec![HeadId(2), HeadId(1)]);
        assert_eq!(r.head(HeadId(1)).unwrap().name, None);
    }

    #[test]
    fn duplicate_announcement_releases_stale_modes() {
        let mut r = registry_with_head();
        r.on_mode_announced(HeadId(1), ModeId(10));
        r.on_mode_announced(HeadId(1), ModeId(11));

        let mut log = ReleaseLog::default();
        r.on_head_announced(HeadId(1), &mut log);
        assert_eq!(
            log.released,
            vec![
                Released::Mode(ModeId(10)),
                Released::Mode(ModeId(11)),
                Released::Head(HeadId(1)),
            ]
        );
        assert!(r.head(HeadId(1)).unwrap().modes.is_empty());
        assert!(r.owner_of(ModeId(10)).is_none());

        let mut log = ReleaseLog::default();
        r.clear(&mut log);
        assert_eq!(log.released, vec![Released::Head(HeadId(1))]);
    }

    #[test]
    fn snapshot_serial_shifts() {
        let mut r = OutputRegistry::new();
        assert_eq!(r.serial(), None);
        r.on_snapshot_complete(5);
        assert_eq!((r.serial(), r.previous_serial()), (Some(5), None));
        r.on_snapshot_complete(9);
        assert_eq!((r.serial(), r.previous_serial()), (Some(9), Some(5)));
    }

    #[test]
    fn listing_reflects_live_state() {
        let mut r = registry_with_head();
        let names = |r: &OutputRegistry| -> Vec<String> {
            r.heads().map(|h| h.display_name().to_string()).collect()
        };
        assert_eq!(names(&r), vec!["eDP-1"]);
        announce(&mut r, HeadId(2));
        assert_eq!(names(&r), vec!["eDP-1", "(unknown)"]);
    }

    #[test]
    fn clear_releases_everything() {
        let mut r = registry_with_head();
        r.on_mode_announced(HeadId(1), ModeId(10));
        announce(&mut r, HeadId(2));
        let mut log = ReleaseLog::default();
        r.clear(&mut log);
        assert!(r.is_empty());
        assert_eq!(
            log.released,
            vec![
                Released::Mode(ModeId(10)),
                Released::Head(HeadId(1)),
                Released::Head(HeadId(2)),
            ]
        );
    }
}
