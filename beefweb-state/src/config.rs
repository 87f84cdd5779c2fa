//! Listener configuration

use std::time::Duration;

use beefweb_api::{Credentials, FieldSelection, PlaylistRef, ServerAddress};
use beefweb_stream::{SubscriptionConfig, SubscriptionEndpoint, DEFAULT_RECONNECT_INTERVAL};

use crate::error::{Result, StateError};

/// Default grace window for idle player updates
pub const DEFAULT_IDLE_GRACE: Duration = Duration::from_millis(250);

/// Port beefweb listens on out of the box
pub const DEFAULT_PORT: u16 = 8880;

/// Configuration for an [`EventListener`](crate::EventListener)
#[derive(Debug, Clone, PartialEq)]
pub struct ListenerConfig {
    /// Host name or address, with or without `http://`
    /// Default: "localhost"
    pub base_address: String,

    /// Default: 8880
    pub port: u16,

    /// Basic-auth credentials for protected servers
    /// Default: None
    pub credentials: Option<Credentials>,

    /// Metadata requested for the active item; `None` uses the default set
    pub active_item_fields: Option<FieldSelection>,

    /// How long an idle player update is held back before it is accepted.
    /// Zero delivers idle updates immediately.
    /// Default: 250 ms
    pub idle_grace: Duration,

    /// Playlist to stream an item window from
    /// Default: None
    pub playlist_ref: Option<PlaylistRef>,

    /// Metadata requested for playlist items; `None` uses the default set
    pub playlist_item_fields: Option<FieldSelection>,

    /// Default: 0
    pub window_offset: u32,

    /// Default: None (to the end of the playlist)
    pub window_count: Option<u32>,

    /// Interval used by [`EventListener::connect_default`](crate::EventListener::connect_default)
    /// Default: 5 seconds
    pub reconnect_interval: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            base_address: "localhost".to_string(),
            port: DEFAULT_PORT,
            credentials: None,
            active_item_fields: None,
            idle_grace: DEFAULT_IDLE_GRACE,
            playlist_ref: None,
            playlist_item_fields: None,
            window_offset: 0,
            window_count: None,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
        }
    }
}

impl ListenerConfig {
    pub fn new(base_address: impl Into<String>, port: u16) -> Self {
        Self {
            base_address: base_address.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_active_item_fields(mut self, fields: FieldSelection) -> Self {
        self.active_item_fields = Some(fields);
        self
    }

    pub fn with_idle_grace(mut self, grace: Duration) -> Self {
        self.idle_grace = grace;
        self
    }

    /// Set the grace window in (fractional) seconds
    pub fn with_idle_grace_seconds(self, seconds: f64) -> Result<Self> {
        let grace = Duration::try_from_secs_f64(seconds).map_err(|e| {
            StateError::ConfigurationError(format!("invalid idle grace {seconds}: {e}"))
        })?;
        Ok(self.with_idle_grace(grace))
    }

    pub fn with_playlist(mut self, playlist: impl Into<PlaylistRef>) -> Self {
        self.playlist_ref = Some(playlist.into());
        self
    }

    pub fn with_playlist_item_fields(mut self, fields: FieldSelection) -> Self {
        self.playlist_item_fields = Some(fields);
        self
    }

    pub fn with_window(mut self, offset: u32, count: Option<u32>) -> Self {
        self.window_offset = offset;
        self.window_count = count;
        self
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_address.trim().is_empty() {
            return Err(StateError::ConfigurationError(
                "base address must not be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(StateError::ConfigurationError(
                "port must be greater than 0".to_string(),
            ));
        }
        if self.reconnect_interval.is_zero() {
            return Err(StateError::ConfigurationError(
                "reconnect interval must be greater than 0".to_string(),
            ));
        }
        self.subscription_config().validate()?;
        Ok(())
    }

    /// Field selection for the active item, defaults filled in
    pub fn active_item_selection(&self) -> FieldSelection {
        self.active_item_fields.clone().unwrap_or_default()
    }

    /// Field selection for playlist items, defaults filled in
    pub fn playlist_item_selection(&self) -> FieldSelection {
        self.playlist_item_fields.clone().unwrap_or_default()
    }

    pub fn server_address(&self) -> Result<ServerAddress> {
        Ok(ServerAddress::new(&self.base_address, self.port)?)
    }

    pub fn subscription_config(&self) -> SubscriptionConfig {
        SubscriptionConfig {
            active_item_fields: self.active_item_selection(),
            playlist_ref: self.playlist_ref.clone(),
            playlist_item_fields: self.playlist_item_selection(),
            window_offset: self.window_offset,
            window_count: self.window_count,
        }
    }

    /// Stream URL and credentials for this configuration
    pub fn subscription_endpoint(&self) -> Result<SubscriptionEndpoint> {
        self.validate()?;
        Ok(SubscriptionEndpoint::new(
            &self.server_address()?,
            &self.subscription_config(),
            self.credentials.clone(),
        )?)
    }
}
