//! [`OutputConfigurator`] over live protocol proxies.

use super::dispatch::WaylandState;
use super::proxies::{configuration_id, ProxyTable};
use super::WaylandError;
use crate::logging::REQUEST;
use crate::output::{ConfigurationId, HeadId, ModeId, Transform};
use crate::traits::{HeadChange, ObjectRelease, OutputConfigurator};
use log::info;
use wayland_client::protocol::wl_output;
use wayland_client::{Proxy, QueueHandle};
use wayland_protocols_wlr::output_management::v1::client::{
    zwlr_output_configuration_head_v1, zwlr_output_head_v1::AdaptiveSyncState,
    zwlr_output_manager_v1::ZwlrOutputManagerV1,
};

/// Borrowed view of the transport used while the controller runs.
pub struct WaylandTransport<'a> {
    pub proxies: &'a mut ProxyTable,
    pub manager: Option<&'a ZwlrOutputManagerV1>,
    pub qh: &'a QueueHandle<WaylandState>,
}

pub fn wl_transform(t: Transform) -> wl_output::Transform {
    match t {
        Transform::Normal => wl_output::Transform::Normal,
        Transform::Rotate90 => wl_output::Transform::_90,
        Transform::Rotate180 => wl_output::Transform::_180,
        Transform::Rotate270 => wl_output::Transform::_270,
        Transform::Flipped => wl_output::Transform::Flipped,
        Transform::Flipped90 => wl_output::Transform::Flipped90,
        Transform::Flipped180 => wl_output::Transform::Flipped180,
        Transform::Flipped270 => wl_output::Transform::Flipped270,
    }
}

pub fn adaptive_sync_state(enabled: bool) -> AdaptiveSyncState {
    if enabled {
        AdaptiveSyncState::Enabled
    } else {
        AdaptiveSyncState::Disabled
    }
}

impl OutputConfigurator for WaylandTransport<'_> {
    type Error = WaylandError;

    fn create_configuration(&mut self, serial: u32) -> Result<ConfigurationId, WaylandError> {
        let manager = self.manager.ok_or(WaylandError::ManagerGone)?;
        let config = manager.create_configuration(serial, self.qh, ());
        let id = configuration_id(&config);
        info!(target: REQUEST, "zwlr_output_manager_v1.create_configuration serial {} -> {}", serial, id);
        self.proxies.configurations.insert(id, config);
        Ok(id)
    }

    fn enable_head(&mut self, config: ConfigurationId, head: HeadId) -> Result<(), WaylandError> {
        let proxy = self.proxies.head(head)?;
        let scope = self.proxies.configuration(config)?.enable_head(proxy, self.qh, ());
        info!(target: REQUEST, "zwlr_output_configuration_v1.enable_head {} {}", config, head);
        self.proxies.head_configs.insert((config, head), scope);
        Ok(())
    }

    fn disable_head(&mut self, config: ConfigurationId, head: HeadId) -> Result<(), WaylandError> {
        let proxy = self.proxies.head(head)?;
        self.proxies.configuration(config)?.disable_head(proxy);
        info!(target: REQUEST, "zwlr_output_configuration_v1.disable_head {} {}", config, head);
        Ok(())
    }

    fn configure_head(
        &mut self,
        config: ConfigurationId,
        head: HeadId,
        change: HeadChange,
    ) -> Result<(), WaylandError> {
        let scope = self.proxies.head_config(config, head)?;
        match change {
            HeadChange::Mode(mode) => {
                scope.set_mode(self.proxies.mode(mode)?);
                info!(target: REQUEST, "zwlr_output_configuration_head_v1.set_mode {} {}", head, mode);
            }
            HeadChange::CustomMode(m) => {
                scope.set_custom_mode(m.width, m.height, m.refresh);
                info!(
                    target: REQUEST,
                    "zwlr_output_configuration_head_v1.set_custom_mode {} {}x{}@{}",
                    head, m.width, m.height, m.refresh
                );
            }
            HeadChange::Position(p) => {
                scope.set_position(p.x, p.y);
                info!(target: REQUEST, "zwlr_output_configuration_head_v1.set_position {} {},{}", head, p.x, p.y);
            }
            HeadChange::Transform(t) => {
                scope.set_transform(wl_transform(t));
                info!(target: REQUEST, "zwlr_output_configuration_head_v1.set_transform {} {}", head, t);
            }
            HeadChange::Scale(s) => {
                scope.set_scale(s.to_f64());
                info!(target: REQUEST, "zwlr_output_configuration_head_v1.set_scale {} {}", head, s);
            }
            HeadChange::AdaptiveSync(enabled) => {
                let since = zwlr_output_configuration_head_v1::REQ_SET_ADAPTIVE_SYNC_SINCE;
                if scope.version() < since {
                    return Err(WaylandError::Unsupported {
                        request: "set_adaptive_sync",
                        version: scope.version(),
                        since,
                    });
                }
                scope.set_adaptive_sync(adaptive_sync_state(enabled));
                info!(
                    target: REQUEST,
                    "zwlr_output_configuration_head_v1.set_adaptive_sync {} {}",
                    head, enabled
                );
            }
        }
        Ok(())
    }

    fn apply(&mut self, config: ConfigurationId) -> Result<(), WaylandError> {
        self.proxies.configuration(config)?.apply();
        info!(target: REQUEST, "zwlr_output_configuration_v1.apply {}", config);
        Ok(())
    }

    fn destroy_configuration(&mut self, config: ConfigurationId) {
        self.proxies.destroy_configuration(config);
    }
}

impl ObjectRelease for WaylandTransport<'_> {
    fn release_mode(&mut self, mode: ModeId) {
        self.proxies.release_mode(mode);
    }

    fn release_head(&mut self, head: HeadId) {
        self.proxies.release_head(head);
    }
}
