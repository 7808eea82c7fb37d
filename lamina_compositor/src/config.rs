// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor thread configuration.

use std::borrow::Cow;

/// How the compositor thread is spawned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositorConfig {
    /// Name given to the compositor thread.
    pub thread_name: Cow<'static, str>,
    /// Stack size for the compositor thread, or `None` for the platform
    /// default.
    pub stack_size: Option<usize>,
}

impl CompositorConfig {
    /// The default thread name.
    pub const DEFAULT_THREAD_NAME: &'static str = "lamina-compositor";

    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            thread_name: Cow::Borrowed(Self::DEFAULT_THREAD_NAME),
            stack_size: None,
        }
    }

    /// Sets the thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Sets the thread stack size in bytes.
    #[must_use]
    pub const fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = CompositorConfig::new()
            .with_thread_name("test-compositor")
            .with_stack_size(256 * 1024);
        assert_eq!(config.thread_name, "test-compositor");
        assert_eq!(config.stack_size, Some(256 * 1024));
        assert_eq!(
            CompositorConfig::default().thread_name,
            CompositorConfig::DEFAULT_THREAD_NAME
        );
    }
}
