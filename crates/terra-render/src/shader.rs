//! WGSL program loading and validation.
//!
//! Programs are embedded in the binary and may be overridden from a directory
//! on disk. Every source is parsed and validated with naga before a wgpu
//! module is created, so a broken program surfaces as a [`ShaderError`]
//! instead of a device validation panic.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, info};
use terra_scene::GlobeError;
use thiserror::Error;
use wgpu::{ShaderModuleDescriptor, ShaderSource};

/// Error types for shader loading operations.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader '{name}' failed to compile: {message}")]
    CompilationFailed { name: String, message: String },

    #[error("shader file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read shader file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ShaderError {
    fn program_name(&self) -> String {
        match self {
            Self::CompilationFailed { name, .. } => name.clone(),
            Self::FileNotFound { path } | Self::Io { path, .. } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

impl From<ShaderError> for GlobeError {
    fn from(err: ShaderError) -> Self {
        let name = err.program_name();
        let message = match err {
            ShaderError::CompilationFailed { message, .. } => message,
            other => other.to_string(),
        };
        GlobeError::ShaderCompileFailure { name, message }
    }
}

/// One of the four globe programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    PlanetVertex,
    PlanetFragment,
    AtmosphereVertex,
    AtmosphereFragment,
}

impl Program {
    pub const ALL: [Program; 4] = [
        Self::PlanetVertex,
        Self::PlanetFragment,
        Self::AtmosphereVertex,
        Self::AtmosphereFragment,
    ];

    /// File name looked up in an override directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::PlanetVertex => "planet.vert.wgsl",
            Self::PlanetFragment => "planet.frag.wgsl",
            Self::AtmosphereVertex => "atmosphere.vert.wgsl",
            Self::AtmosphereFragment => "atmosphere.frag.wgsl",
        }
    }

    pub fn entry_point(self) -> &'static str {
        match self {
            Self::PlanetVertex | Self::AtmosphereVertex => "vs_main",
            Self::PlanetFragment | Self::AtmosphereFragment => "fs_main",
        }
    }

    fn embedded(self) -> &'static str {
        match self {
            Self::PlanetVertex => include_str!("shaders/planet.vert.wgsl"),
            Self::PlanetFragment => include_str!("shaders/planet.frag.wgsl"),
            Self::AtmosphereVertex => include_str!("shaders/atmosphere.vert.wgsl"),
            Self::AtmosphereFragment => include_str!("shaders/atmosphere.frag.wgsl"),
        }
    }
}

/// WGSL source text for every [`Program`].
#[derive(Debug, Clone)]
pub struct ShaderSources {
    sources: HashMap<Program, String>,
}

impl ShaderSources {
    /// The programs compiled into the binary.
    pub fn embedded() -> Self {
        Self {
            sources: Program::ALL
                .into_iter()
                .map(|p| (p, p.embedded().to_string()))
                .collect(),
        }
    }

    /// Embedded programs, or all four read from `dir` when one is given.
    ///
    /// A directory that lacks any of the four files is rejected with
    /// [`ShaderError::FileNotFound`] naming the first missing program.
    pub fn load(dir: Option<&Path>) -> Result<Self, ShaderError> {
        let mut sources = Self::embedded();
        let Some(dir) = dir else {
            return Ok(sources);
        };
        if !dir.is_dir() {
            return Err(ShaderError::FileNotFound {
                path: dir.to_path_buf(),
            });
        }
        for program in Program::ALL {
            let path = dir.join(program.file_name());
            if !path.is_file() {
                return Err(ShaderError::FileNotFound { path });
            }
            debug!("Loading shader override {}", path.display());
            let text = std::fs::read_to_string(&path).map_err(|source| ShaderError::Io {
                path: path.clone(),
                source,
            })?;
            sources.sources.insert(program, text);
        }
        Ok(sources)
    }

    pub fn get(&self, program: Program) -> &str {
        self.sources
            .get(&program)
            .map(String::as_str)
            .unwrap_or_else(|| program.embedded())
    }

    /// Replace one program's text.
    pub fn set(&mut self, program: Program, source: impl Into<String>) {
        self.sources.insert(program, source.into());
    }

    /// Validate every program, stopping at the first failure.
    pub fn validate(&self) -> Result<(), ShaderError> {
        for program in Program::ALL {
            validate_wgsl(program.file_name(), self.get(program))?;
        }
        Ok(())
    }
}

/// Parse and validate WGSL with naga.
pub fn validate_wgsl(name: &str, source: &str) -> Result<naga::Module, ShaderError> {
    let module =
        naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::CompilationFailed {
            name: name.to_string(),
            message: e.emit_to_string(source),
        })?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| ShaderError::CompilationFailed {
        name: name.to_string(),
        message: e.emit_to_string(source),
    })?;
    Ok(module)
}

/// Compiled wgpu modules keyed by program.
#[derive(Default)]
pub struct ShaderLibrary {
    modules: HashMap<Program, Arc<wgpu::ShaderModule>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and compile all four programs.
    pub fn compile_all(
        device: &wgpu::Device,
        sources: &ShaderSources,
    ) -> Result<Self, ShaderError> {
        let mut library = Self::new();
        for program in Program::ALL {
            library.compile(device, program, sources.get(program))?;
        }
        Ok(library)
    }

    /// Validate `source` and create a module for `program`, replacing any
    /// previous one.
    pub fn compile(
        &mut self,
        device: &wgpu::Device,
        program: Program,
        source: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        let name = program.file_name();
        validate_wgsl(name, source)?;

        let module = Arc::new(device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        }));
        if self.modules.insert(program, module.clone()).is_some() {
            info!("Replaced shader '{name}'");
        } else {
            debug!("Compiled shader '{name}'");
        }
        Ok(module)
    }

    pub fn get(&self, program: Program) -> Option<Arc<wgpu::ShaderModule>> {
        self.modules.get(&program).cloned()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
