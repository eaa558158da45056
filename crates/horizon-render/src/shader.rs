//! Shader module loading and caching.
//!
//! Every horizon shader is embedded WGSL with the tone mapping snippet
//! prepended, see [`ShaderLibrary::load_with_tonemap`].

use log::{debug, info};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use wgpu::{ShaderModuleDescriptor, ShaderSource};

use crate::tonemap::TONEMAP_WGSL;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader '{name}' not found in library")]
    NotLoaded { name: String },
}

/// Registry of compiled shader modules keyed by name.
pub struct ShaderLibrary {
    modules: HashMap<String, Arc<wgpu::ShaderModule>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Compile WGSL source and cache it under `name`, replacing any previous module.
    pub fn load_from_source(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        source: &str,
    ) -> Arc<wgpu::ShaderModule> {
        debug!("Loading shader '{}' from source", name);

        let module = Arc::new(device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        }));
        let replaced = self
            .modules
            .insert(name.to_string(), module.clone())
            .is_some();

        if replaced {
            info!("Replaced shader '{}'", name);
        } else {
            info!("Loaded shader '{}'", name);
        }
        module
    }

    /// Like [`load_from_source`](Self::load_from_source) with the tone
    /// mapping functions available to `source`.
    pub fn load_with_tonemap(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        source: &str,
    ) -> Arc<wgpu::ShaderModule> {
        let combined = with_tonemap(source);
        self.load_from_source(device, name, &combined)
    }

    pub fn get(&self, name: &str) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| ShaderError::NotLoaded {
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}

fn with_tonemap(source: &str) -> String {
    format!("{TONEMAP_WGSL}\n{source}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_device;

    const VALID_SHADER: &str = r#"
        @vertex
        fn vs_main(@builtin(vertex_index) idx: u32) -> @builtin(position) vec4<f32> {
            return vec4<f32>(0.0, 0.0, 0.0, 1.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(tone_map(vec3<f32>(1.0), 1.0, 2u), 1.0);
        }
    "#;

    #[test]
    fn test_library_starts_empty() {
        let library = ShaderLibrary::new();
        assert!(library.is_empty());
        assert!(matches!(
            library.get("sky"),
            Err(ShaderError::NotLoaded { name }) if name == "sky"
        ));
    }

    #[test]
    fn test_tonemap_prepended() {
        let combined = with_tonemap("fn main_body() {}");
        assert!(combined.starts_with(TONEMAP_WGSL));
        assert!(combined.ends_with("fn main_body() {}"));
    }

    #[test]
    fn test_load_with_tonemap_compiles() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        library.load_with_tonemap(&device, "test", VALID_SHADER);
        assert_eq!(library.len(), 1);
        assert!(library.get("test").is_ok());
    }

    #[test]
    fn test_reload_replaces_cached_module() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        let original = library.load_with_tonemap(&device, "reloadable", VALID_SHADER);
        let reloaded = library.load_with_tonemap(&device, "reloadable", VALID_SHADER);
        assert_eq!(library.len(), 1);
        assert!(!Arc::ptr_eq(&original, &reloaded));
    }
}
