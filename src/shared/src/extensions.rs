use std::collections::HashMap;
use crate::{ShaderStage, TranslateOptions};

/// GLSL extensions the translator knows about
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Extension {
    StandardDerivatives,
    FragDepth,
}

impl Extension {
    pub fn all() -> &'static [Extension] {
        &[Extension::StandardDerivatives, Extension::FragDepth]
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Extension::StandardDerivatives => "GL_OES_standard_derivatives",
            Extension::FragDepth => "GL_EXT_frag_depth",
        }
    }

    pub fn from_name(name: &str) -> Option<Extension> {
        Extension::all().iter().cloned().find(|ext| ext.name() == name)
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ExtensionBehavior {
    Enable,
    Require,
    Warn,
    Disable,
}

impl ExtensionBehavior {
    pub fn from_name(name: &str) -> Option<ExtensionBehavior> {
        Some(match name {
            "enable" => ExtensionBehavior::Enable,
            "require" => ExtensionBehavior::Require,
            "warn" => ExtensionBehavior::Warn,
            "disable" => ExtensionBehavior::Disable,
            _ => return None,
        })
    }
}

/// Which extensions a compile may use and which ones the shader turned on
#[derive(PartialEq, Debug, Clone)]
pub struct ExtensionState {
    supported: Vec<Extension>,
    behaviors: HashMap<Extension, ExtensionBehavior>,
}

impl ExtensionState {
    pub fn new(stage: ShaderStage, options: TranslateOptions) -> ExtensionState {
        let mut supported = vec![];
        if stage == ShaderStage::Fragment {
            if options.contains(TranslateOptions::ENABLE_STANDARD_DERIVATIVES) {
                supported.push(Extension::StandardDerivatives);
            }
            if options.contains(TranslateOptions::ENABLE_FRAG_DEPTH) {
                supported.push(Extension::FragDepth);
            }
        }
        ExtensionState {
            supported,
            behaviors: HashMap::new(),
        }
    }

    pub fn is_supported(&self, extension: Extension) -> bool {
        self.supported.contains(&extension)
    }

    pub fn supported(&self) -> &[Extension] {
        &self.supported
    }

    pub fn set_behavior(&mut self, extension: Extension, behavior: ExtensionBehavior) {
        self.behaviors.insert(extension, behavior);
    }

    /// Apply a behavior to every extension, as `#extension all` does
    pub fn set_all(&mut self, behavior: ExtensionBehavior) {
        for extension in Extension::all() {
            self.behaviors.insert(*extension, behavior);
        }
    }

    /// True when identifiers guarded by the extension resolve
    pub fn is_enabled(&self, extension: Extension) -> bool {
        if !self.is_supported(extension) {
            return false;
        }
        match self.behaviors.get(&extension) {
            Some(ExtensionBehavior::Enable) |
            Some(ExtensionBehavior::Require) |
            Some(ExtensionBehavior::Warn) => true,
            Some(ExtensionBehavior::Disable) | None => false,
        }
    }
}

#[test]
fn test_extension_state() {
    let options = TranslateOptions::ENABLE_STANDARD_DERIVATIVES;
    let mut state = ExtensionState::new(ShaderStage::Fragment, options);
    assert!(state.is_supported(Extension::StandardDerivatives));
    assert!(!state.is_enabled(Extension::StandardDerivatives));
    state.set_behavior(Extension::StandardDerivatives, ExtensionBehavior::Enable);
    assert!(state.is_enabled(Extension::StandardDerivatives));
    state.set_all(ExtensionBehavior::Disable);
    assert!(!state.is_enabled(Extension::StandardDerivatives));

    let mut vertex = ExtensionState::new(ShaderStage::Vertex, options);
    vertex.set_behavior(Extension::StandardDerivatives, ExtensionBehavior::Enable);
    assert!(!vertex.is_enabled(Extension::StandardDerivatives));
    assert_eq!(Extension::from_name("GL_EXT_frag_depth"), Some(Extension::FragDepth));
}
