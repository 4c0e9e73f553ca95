//! Startup validation of every shipped shader program.

use std::collections::BTreeMap;

use prism_core::profile_scope;

use super::{FRAGMENT_ENTRY, ShaderProgram, VERTEX_ENTRY};
use crate::error::{GraphicsError, ShaderStage};

/// A shader program that parsed, validated and exposes both entry points.
pub struct CompiledProgram {
    program: ShaderProgram,
    source: &'static str,
    module: naga::Module,
    info: naga::valid::ModuleInfo,
}

impl CompiledProgram {
    pub fn program(&self) -> ShaderProgram {
        self.program
    }

    /// The WGSL source the module was built from.
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// The validated naga module.
    pub fn module(&self) -> &naga::Module {
        &self.module
    }

    pub fn info(&self) -> &naga::valid::ModuleInfo {
        &self.info
    }

    /// Names of the module's global bindings as `(group, binding)` pairs.
    pub fn bindings(&self) -> Vec<(u32, u32)> {
        let mut bindings: Vec<(u32, u32)> = self
            .module
            .global_variables
            .iter()
            .filter_map(|(_, var)| var.binding.as_ref().map(|b| (b.group, b.binding)))
            .collect();
        bindings.sort_unstable();
        bindings
    }
}

impl std::fmt::Debug for CompiledProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledProgram")
            .field("program", &self.program)
            .field("entry_points", &self.module.entry_points.len())
            .finish()
    }
}

/// Every shader program, built once at startup.
///
/// Building parses each WGSL source with naga and validates the module
/// (the compile stage), then checks that `vs_main` and `fs_main` exist with
/// the right stages (the link stage).
pub struct ShaderLibrary {
    programs: BTreeMap<ShaderProgram, CompiledProgram>,
}

impl ShaderLibrary {
    /// Build all programs in [`ShaderProgram::ALL`].
    pub fn build() -> Result<Self, GraphicsError> {
        Self::build_programs(&ShaderProgram::ALL)
    }

    /// Build a subset of programs.
    pub fn build_programs(programs: &[ShaderProgram]) -> Result<Self, GraphicsError> {
        profile_scope!("shader_library_build");
        let mut built = BTreeMap::new();
        for &program in programs {
            let compiled = compile_program(program, program.source())?;
            built.insert(program, compiled);
        }
        log::info!("Built {} shader programs", built.len());
        Ok(Self { programs: built })
    }

    /// Look up a built program.
    pub fn program(&self, program: ShaderProgram) -> Result<&CompiledProgram, GraphicsError> {
        self.programs
            .get(&program)
            .ok_or_else(|| GraphicsError::ShaderBuildFailure {
                program,
                stage: ShaderStage::Link,
                log: "program was not built".to_string(),
            })
    }

    pub fn contains(&self, program: ShaderProgram) -> bool {
        self.programs.contains_key(&program)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

impl std::fmt::Debug for ShaderLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderLibrary")
            .field("programs", &self.programs.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Parse, validate and link one WGSL source as `program`.
pub fn compile_program(
    program: ShaderProgram,
    source: &'static str,
) -> Result<CompiledProgram, GraphicsError> {
    let module =
        naga::front::wgsl::parse_str(source).map_err(|e| GraphicsError::ShaderBuildFailure {
            program,
            stage: ShaderStage::Compile,
            log: e.emit_to_string(source),
        })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    let info = validator
        .validate(&module)
        .map_err(|e| GraphicsError::ShaderBuildFailure {
            program,
            stage: ShaderStage::Compile,
            log: e.emit_to_string(source),
        })?;

    for (name, stage) in [
        (VERTEX_ENTRY, naga::ShaderStage::Vertex),
        (FRAGMENT_ENTRY, naga::ShaderStage::Fragment),
    ] {
        let found = module
            .entry_points
            .iter()
            .any(|ep| ep.name == name && ep.stage == stage);
        if !found {
            return Err(GraphicsError::ShaderBuildFailure {
                program,
                stage: ShaderStage::Link,
                log: format!("missing {stage:?} entry point `{name}`"),
            });
        }
    }

    log::debug!("Shader {program} validated");
    Ok(CompiledProgram {
        program,
        source,
        module,
        info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_programs_validate() {
        let library = match ShaderLibrary::build() {
            Ok(library) => library,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(library.len(), ShaderProgram::ALL.len());
        for program in ShaderProgram::ALL {
            assert!(library.contains(program));
        }
    }

    #[test]
    fn syntax_errors_fail_at_compile_stage() {
        let err = compile_program(ShaderProgram::Irradiance, "fn vs_main( {").unwrap_err();
        match err {
            GraphicsError::ShaderBuildFailure { program, stage, .. } => {
                assert_eq!(program, ShaderProgram::Irradiance);
                assert_eq!(stage, ShaderStage::Compile);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_entry_point_fails_at_link_stage() {
        let source = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";
        let err = compile_program(ShaderProgram::Pbr, source).unwrap_err();
        match err {
            GraphicsError::ShaderBuildFailure { stage, log, .. } => {
                assert_eq!(stage, ShaderStage::Link);
                assert!(log.contains("fs_main"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unbuilt_program_lookup_fails() {
        let library = ShaderLibrary::build_programs(&[ShaderProgram::Downsample]).unwrap();
        assert!(library.program(ShaderProgram::Downsample).is_ok());
        assert!(library.program(ShaderProgram::Pbr).is_err());
    }

    #[test]
    fn pbr_binds_eight_textures_and_a_sampler() {
        let library = ShaderLibrary::build_programs(&[ShaderProgram::Pbr]).unwrap();
        let bindings = library.program(ShaderProgram::Pbr).unwrap().bindings();
        let group1: Vec<u32> = bindings
            .iter()
            .filter(|(g, _)| *g == 1)
            .map(|(_, b)| *b)
            .collect();
        assert_eq!(group1, (0..=8).collect::<Vec<_>>());
    }
}
