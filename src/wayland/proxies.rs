//! Live protocol proxies, keyed by the ids the rest of the crate uses.

use super::WaylandError;
use crate::logging::REQUEST;
use crate::output::{ConfigurationId, HeadId, ModeId};
use crate::traits::ObjectRelease;
use log::info;
use std::collections::HashMap;
use wayland_client::Proxy;
use wayland_protocols_wlr::output_management::v1::client::{
    zwlr_output_configuration_head_v1::ZwlrOutputConfigurationHeadV1,
    zwlr_output_configuration_v1::ZwlrOutputConfigurationV1,
    zwlr_output_head_v1::{self, ZwlrOutputHeadV1},
    zwlr_output_mode_v1::{self, ZwlrOutputModeV1},
};

pub fn head_id(head: &ZwlrOutputHeadV1) -> HeadId {
    HeadId(head.id().protocol_id())
}

pub fn mode_id(mode: &ZwlrOutputModeV1) -> ModeId {
    ModeId(mode.id().protocol_id())
}

pub fn configuration_id(config: &ZwlrOutputConfigurationV1) -> ConfigurationId {
    ConfigurationId(config.id().protocol_id())
}

/// Every proxy the client currently holds.
#[derive(Debug, Default)]
pub struct ProxyTable {
    pub heads: HashMap<HeadId, ZwlrOutputHeadV1>,
    pub modes: HashMap<ModeId, ZwlrOutputModeV1>,
    pub configurations: HashMap<ConfigurationId, ZwlrOutputConfigurationV1>,
    pub head_configs: HashMap<(ConfigurationId, HeadId), ZwlrOutputConfigurationHeadV1>,
}

impl ProxyTable {
    pub fn head(&self, id: HeadId) -> Result<&ZwlrOutputHeadV1, WaylandError> {
        self.heads
            .get(&id)
            .ok_or_else(|| WaylandError::UnknownObject(id.to_string()))
    }

    pub fn mode(&self, id: ModeId) -> Result<&ZwlrOutputModeV1, WaylandError> {
        self.modes
            .get(&id)
            .ok_or_else(|| WaylandError::UnknownObject(id.to_string()))
    }

    pub fn configuration(&self, id: ConfigurationId) -> Result<&ZwlrOutputConfigurationV1, WaylandError> {
        self.configurations
            .get(&id)
            .ok_or_else(|| WaylandError::UnknownObject(id.to_string()))
    }

    pub fn head_config(
        &self,
        config: ConfigurationId,
        head: HeadId,
    ) -> Result<&ZwlrOutputConfigurationHeadV1, WaylandError> {
        self.head_configs
            .get(&(config, head))
            .ok_or_else(|| WaylandError::UnknownObject(format!("{} in {}", head, config)))
    }

    /// Destroy a configuration object.  Its per-head scopes die with it.
    pub fn destroy_configuration(&mut self, id: ConfigurationId) {
        self.head_configs.retain(|(config, _), _| *config != id);
        if let Some(config) = self.configurations.remove(&id) {
            config.destroy();
            info!(target: REQUEST, "zwlr_output_configuration_v1.destroy {}", id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty() && self.modes.is_empty() && self.configurations.is_empty()
    }
}

/// Releasing is idempotent: an id without a live proxy is ignored.  Objects
/// older than version 3 have no release request and are simply dropped.
impl ObjectRelease for ProxyTable {
    fn release_mode(&mut self, id: ModeId) {
        let Some(mode) = self.modes.remove(&id) else {
            return;
        };
        if mode.version() >= zwlr_output_mode_v1::REQ_RELEASE_SINCE {
            mode.release();
            info!(target: REQUEST, "zwlr_output_mode_v1.release {}", id);
        }
    }

    fn release_head(&mut self, id: HeadId) {
        let Some(head) = self.heads.remove(&id) else {
            return;
        };
        if head.version() >= zwlr_output_head_v1::REQ_RELEASE_SINCE {
            head.release();
            info!(target: REQUEST, "zwlr_output_head_v1.release {}", id);
        }
    }
}
