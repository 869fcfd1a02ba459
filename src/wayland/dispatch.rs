//! Event handlers: protocol events in, registry and controller updates out.

use super::proxies::{configuration_id, head_id, mode_id, ProxyTable};
use super::transport::WaylandTransport;
use crate::controller::OutputController;
use crate::logging::{EVENT, REQUEST};
use crate::output::{Fixed, PhysicalSize, Position};
use crate::registry::{HeadAttribute, ModeAttribute};
use crate::traits::ObjectRelease;
use crate::transaction::Outcome;
use log::{info, warn};
use wayland_client::protocol::{wl_output, wl_registry};
use wayland_client::{event_created_child, Connection, Dispatch, Proxy, QueueHandle, WEnum};
use wayland_protocols_wlr::output_management::v1::client::{
    zwlr_output_configuration_head_v1::{self, ZwlrOutputConfigurationHeadV1},
    zwlr_output_configuration_v1::{self, ZwlrOutputConfigurationV1},
    zwlr_output_head_v1::{self, AdaptiveSyncState, ZwlrOutputHeadV1},
    zwlr_output_manager_v1::{self, ZwlrOutputManagerV1},
    zwlr_output_mode_v1::{self, ZwlrOutputModeV1},
};

/// Highest manager version this client speaks.
pub const MANAGER_VERSION: u32 = 4;

/// Everything the event queue dispatches into.
#[derive(Debug)]
pub struct WaylandState {
    pub controller: OutputController,
    pub proxies: ProxyTable,
    pub manager: Option<ZwlrOutputManagerV1>,
    /// Registry name of the bound manager global.
    pub manager_name: Option<u32>,
}

impl WaylandState {
    pub fn new(controller: OutputController) -> Self {
        Self {
            controller,
            proxies: ProxyTable::default(),
            manager: None,
            manager_name: None,
        }
    }

    /// Borrow the controller and a transport over the remaining fields.
    pub fn split<'a>(
        &'a mut self,
        qh: &'a QueueHandle<Self>,
    ) -> (&'a mut OutputController, WaylandTransport<'a>) {
        let transport = WaylandTransport {
            proxies: &mut self.proxies,
            manager: self.manager.as_ref(),
            qh,
        };
        (&mut self.controller, transport)
    }

    fn drop_manager(&mut self) {
        if self.manager.take().is_some() {
            info!("output manager dropped");
        }
        self.manager_name = None;
    }
}

pub fn transform_raw(transform: WEnum<wl_output::Transform>) -> u32 {
    match transform {
        WEnum::Value(t) => t.into(),
        WEnum::Unknown(raw) => raw,
    }
}

pub fn adaptive_sync_enabled(state: WEnum<AdaptiveSyncState>) -> bool {
    matches!(state, WEnum::Value(AdaptiveSyncState::Enabled))
}

//  Registry

impl Dispatch<wl_registry::WlRegistry, ()> for WaylandState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                info!(target: EVENT, "wl_registry.global {} {} v{}", name, interface, version);
                if interface == ZwlrOutputManagerV1::interface().name && state.manager.is_none() {
                    let version = version.min(MANAGER_VERSION);
                    let manager = registry.bind::<ZwlrOutputManagerV1, _, _>(name, version, qh, ());
                    info!(target: REQUEST, "wl_registry.bind {} {} v{}", name, interface, version);
                    state.manager = Some(manager);
                    state.manager_name = Some(name);
                }
            }
            wl_registry::Event::GlobalRemove { name } => {
                info!(target: EVENT, "wl_registry.global_remove {}", name);
                if state.manager_name == Some(name) {
                    state.drop_manager();
                }
            }
            _ => {}
        }
    }
}

//  Manager

impl Dispatch<ZwlrOutputManagerV1, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _: &ZwlrOutputManagerV1,
        event: zwlr_output_manager_v1::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            zwlr_output_manager_v1::Event::Head { head } => {
                let id = head_id(&head);
                info!(target: EVENT, "zwlr_output_manager_v1.head {}", id);
                state
                    .controller
                    .registry_mut()
                    .on_head_announced(id, &mut state.proxies);
                state.proxies.heads.insert(id, head);
            }
            zwlr_output_manager_v1::Event::Done { serial } => {
                info!(target: EVENT, "zwlr_output_manager_v1.done serial {}", serial);
                state.controller.registry_mut().on_snapshot_complete(serial);
            }
            zwlr_output_manager_v1::Event::Finished => {
                info!(target: EVENT, "zwlr_output_manager_v1.finished");
                state.drop_manager();
            }
            _ => {}
        }
    }

    event_created_child!(WaylandState, ZwlrOutputManagerV1, [
        zwlr_output_manager_v1::EVT_HEAD_OPCODE => (ZwlrOutputHeadV1, ())
    ]);
}

//  Head

impl Dispatch<ZwlrOutputHeadV1, ()> for WaylandState {
    fn event(
        state: &mut Self,
        head: &ZwlrOutputHeadV1,
        event: zwlr_output_head_v1::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let id = head_id(head);
        let attribute = match event {
            zwlr_output_head_v1::Event::Name { name } => HeadAttribute::Name(name),
            zwlr_output_head_v1::Event::Description { description } => {
                HeadAttribute::Description(description)
            }
            zwlr_output_head_v1::Event::Make { make } => HeadAttribute::Make(make),
            zwlr_output_head_v1::Event::Model { model } => HeadAttribute::Model(model),
            zwlr_output_head_v1::Event::SerialNumber { serial_number } => {
                HeadAttribute::SerialNumber(serial_number)
            }
            zwlr_output_head_v1::Event::PhysicalSize { width, height } => {
                HeadAttribute::PhysicalSize(PhysicalSize { width, height })
            }
            zwlr_output_head_v1::Event::Enabled { enabled } => HeadAttribute::Enabled(enabled != 0),
            zwlr_output_head_v1::Event::Position { x, y } => HeadAttribute::Position(Position { x, y }),
            zwlr_output_head_v1::Event::Transform { transform } => {
                HeadAttribute::Transform(transform_raw(transform))
            }
            zwlr_output_head_v1::Event::Scale { scale } => match Fixed::from_f64(scale) {
                Some(fixed) => HeadAttribute::Scale(fixed),
                None => {
                    warn!("{} reported unrepresentable scale {}", id, scale);
                    return;
                }
            },
            zwlr_output_head_v1::Event::AdaptiveSync { state: sync } => {
                HeadAttribute::AdaptiveSync(adaptive_sync_enabled(sync))
            }

            zwlr_output_head_v1::Event::Mode { mode } => {
                let announced = mode_id(&mode);
                info!(target: EVENT, "zwlr_output_head_v1.mode {} {}", id, announced);
                state.proxies.modes.insert(announced, mode);
                state.controller.registry_mut().on_mode_announced(id, announced);
                return;
            }
            zwlr_output_head_v1::Event::CurrentMode { mode } => {
                let current = mode_id(&mode);
                info!(target: EVENT, "zwlr_output_head_v1.current_mode {} {}", id, current);
                state.proxies.modes.entry(current).or_insert(mode);
                state.controller.registry_mut().on_current_mode_changed(id, current);
                return;
            }
            zwlr_output_head_v1::Event::Finished => {
                info!(target: EVENT, "zwlr_output_head_v1.finished {}", id);
                state.controller.registry_mut().on_head_removed(id, &mut state.proxies);
                state.proxies.release_head(id);
                return;
            }
            _ => return,
        };
        info!(target: EVENT, "zwlr_output_head_v1 {} {:?}", id, attribute);
        state.controller.registry_mut().on_head_attribute(id, attribute);
    }

    event_created_child!(WaylandState, ZwlrOutputHeadV1, [
        zwlr_output_head_v1::EVT_MODE_OPCODE => (ZwlrOutputModeV1, ())
    ]);
}

//  Mode

impl Dispatch<ZwlrOutputModeV1, ()> for WaylandState {
    fn event(
        state: &mut Self,
        mode: &ZwlrOutputModeV1,
        event: zwlr_output_mode_v1::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let id = mode_id(mode);
        let registry = state.controller.registry_mut();
        match event {
            zwlr_output_mode_v1::Event::Size { width, height } => {
                info!(target: EVENT, "zwlr_output_mode_v1.size {} {}x{}", id, width, height);
                registry.on_mode_attribute(id, ModeAttribute::Size { width, height });
            }
            zwlr_output_mode_v1::Event::Refresh { refresh } => {
                info!(target: EVENT, "zwlr_output_mode_v1.refresh {} {}", id, refresh);
                registry.on_mode_attribute(id, ModeAttribute::Refresh(refresh));
            }
            zwlr_output_mode_v1::Event::Preferred => {
                info!(target: EVENT, "zwlr_output_mode_v1.preferred {}", id);
                registry.on_mode_preferred(id);
            }
            zwlr_output_mode_v1::Event::Finished => {
                info!(target: EVENT, "zwlr_output_mode_v1.finished {}", id);
                registry.on_mode_removed(id, &mut state.proxies);
                state.proxies.release_mode(id);
            }
            _ => {}
        }
    }
}

//  Configuration

impl Dispatch<ZwlrOutputConfigurationV1, ()> for WaylandState {
    fn event(
        state: &mut Self,
        config: &ZwlrOutputConfigurationV1,
        event: zwlr_output_configuration_v1::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        let id = configuration_id(config);
        let outcome = match event {
            zwlr_output_configuration_v1::Event::Succeeded => Outcome::Succeeded,
            zwlr_output_configuration_v1::Event::Failed => Outcome::Failed,
            zwlr_output_configuration_v1::Event::Cancelled => Outcome::Cancelled,
            _ => return,
        };
        info!(target: EVENT, "zwlr_output_configuration_v1.{} {}", outcome, id);

        let (controller, mut transport) = state.split(qh);
        if let Err(e) = controller.on_outcome(id, outcome, &mut transport) {
            warn!("{}", e);
            state.proxies.destroy_configuration(id);
        }
    }
}

impl Dispatch<ZwlrOutputConfigurationHeadV1, ()> for WaylandState {
    fn event(
        _: &mut Self,
        _: &ZwlrOutputConfigurationHeadV1,
        _: zwlr_output_configuration_head_v1::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_values() {
        assert_eq!(transform_raw(WEnum::Value(wl_output::Transform::_270)), 3);
        assert_eq!(transform_raw(WEnum::Value(wl_output::Transform::Flipped)), 4);
        assert_eq!(transform_raw(WEnum::Unknown(42)), 42);
    }

    #[test]
    fn adaptive_sync_values() {
        assert!(adaptive_sync_enabled(WEnum::Value(AdaptiveSyncState::Enabled)));
        assert!(!adaptive_sync_enabled(WEnum::Value(AdaptiveSyncState::Disabled)));
        assert!(!adaptive_sync_enabled(WEnum::Unknown(7)));
    }
}
