use crate::ShaderStage;

bitflags! {
    /// Switches that change what the translator writes
    #[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
    pub struct TranslateOptions: u32 {
        /// Omit the input/output structs and the entry point wrapper
        const DISABLE_WRITE_INPUTS = 0x1;
        /// Only emit helper functions the shader references
        const DISABLE_BOILERPLATE = 0x2;
        /// Allow GL_OES_standard_derivatives to be enabled
        const ENABLE_STANDARD_DERIVATIVES = 0x4;
        /// Allow GL_EXT_frag_depth to be enabled
        const ENABLE_FRAG_DEPTH = 0x8;
        /// Restrict output to what feature level 9 hardware runs
        const FORCE_FEATURE_LEVEL_9 = 0x10;
    }
}

/// Direct3D feature level of the target device
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum FeatureLevel {
    Level9_1,
    Level9_3,
    Level10_0,
    Level10_1,
    Level11_0,
}

impl FeatureLevel {
    /// Resolve the level the translator should target after applying options
    pub fn effective(self, options: TranslateOptions) -> FeatureLevel {
        if options.contains(TranslateOptions::FORCE_FEATURE_LEVEL_9) && self > FeatureLevel::Level9_3 {
            FeatureLevel::Level9_3
        } else {
            self
        }
    }

    pub fn is_level_9(self) -> bool {
        self <= FeatureLevel::Level9_3
    }

    pub fn from_name(name: &str) -> Option<FeatureLevel> {
        Some(match name {
            "9_1" => FeatureLevel::Level9_1,
            "9_3" => FeatureLevel::Level9_3,
            "10_0" => FeatureLevel::Level10_0,
            "10_1" => FeatureLevel::Level10_1,
            "11_0" => FeatureLevel::Level11_0,
            _ => return None,
        })
    }
}

/// Static resource limits enforced during verification
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Limits {
    pub max_source_length: usize,
    pub max_vertex_attribs: u32,
    pub max_vertex_uniform_vectors: u32,
    pub max_fragment_uniform_vectors: u32,
    pub max_varying_vectors: u32,
    pub max_vertex_texture_image_units: u32,
    pub max_texture_image_units: u32,
    pub max_draw_buffers: u32,
    pub max_struct_nesting: u32,
    pub max_function_depth: u32,
    pub max_statement_depth: u32,
    pub max_expression_depth: u32,
}

impl Limits {
    pub fn for_feature_level(feature_level: FeatureLevel) -> Limits {
        let level_9 = feature_level.is_level_9();
        Limits {
            max_source_length: 256 * 1024,
            max_vertex_attribs: 16,
            max_vertex_uniform_vectors: if level_9 { 254 } else { 1024 },
            max_fragment_uniform_vectors: if level_9 { 221 } else { 1024 },
            max_varying_vectors: if level_9 { 8 } else { 10 },
            max_vertex_texture_image_units: 4,
            max_texture_image_units: 16,
            max_draw_buffers: 1,
            max_struct_nesting: 4,
            max_function_depth: 64,
            max_statement_depth: 64,
            max_expression_depth: 256,
        }
    }

    /// Uniform vector slots available to the given stage
    pub fn max_uniform_vectors(&self, stage: ShaderStage) -> u32 {
        match stage {
            ShaderStage::Vertex => self.max_vertex_uniform_vectors,
            ShaderStage::Fragment => self.max_fragment_uniform_vectors,
        }
    }

    /// Sampler units available to the given stage
    pub fn max_samplers(&self, stage: ShaderStage) -> u32 {
        match stage {
            ShaderStage::Vertex => self.max_vertex_texture_image_units,
            ShaderStage::Fragment => self.max_texture_image_units,
        }
    }

    pub fn max_combined_texture_image_units(&self) -> u32 {
        self.max_vertex_texture_image_units + self.max_texture_image_units
    }
}

#[test]
fn test_effective_feature_level() {
    let force = TranslateOptions::FORCE_FEATURE_LEVEL_9;
    assert_eq!(FeatureLevel::Level11_0.effective(force), FeatureLevel::Level9_3);
    assert_eq!(FeatureLevel::Level9_1.effective(force), FeatureLevel::Level9_1);
    assert_eq!(FeatureLevel::Level10_0.effective(TranslateOptions::empty()),
               FeatureLevel::Level10_0);
    assert!(FeatureLevel::Level9_3.is_level_9());
    assert!(!FeatureLevel::Level10_1.is_level_9());
}

#[test]
fn test_limits() {
    let fl9 = Limits::for_feature_level(FeatureLevel::Level9_3);
    assert_eq!(fl9.max_uniform_vectors(ShaderStage::Fragment), 221);
    assert_eq!(fl9.max_varying_vectors, 8);
    let fl10 = Limits::for_feature_level(FeatureLevel::Level10_0);
    assert_eq!(fl10.max_uniform_vectors(ShaderStage::Vertex), 1024);
    assert_eq!(fl10.max_samplers(ShaderStage::Vertex), 4);
}
