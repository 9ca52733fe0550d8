//! FASTBuild descriptor generator.
//!
//! This module walks a resolved [`Project`] and drives a [`BffWriter`] to
//! produce the `.bff` text. Targets are visited in topological order; closure
//! members are visited in name order, so the same project always yields the
//! same bytes.
//!
//! The descriptor is laid out as:
//!
//! 1. the prelude include;
//! 2. declared build configurations, if any;
//! 3. compiler declarations;
//! 4. per-target globals (base path and flag variables);
//! 5. configuration-agnostic target functions;
//! 6. one `ForEach` over `.BuildConfigs` holding every
//!    configuration-dependent target function.

use std::fmt::Write;

use itertools::Itertools;

use crate::compiler::Compiler;
use crate::flags::FlagPropagator;
use crate::graph::Resolution;
use crate::project::{OUTPUT_PATH, Platform, Project, ProjectError, SHARED_OUTPUT_PATH};
use crate::target::{Executable, ObjectList, Subsystem, Target, TargetKind};
use crate::writer::{BffWriter, Value};

const STATIC_CRT_LIBS: &str = "$CRTLibs_Static$ $CppRTLibs_Static$";

/// Generate the descriptor for `project` using an existing resolution.
///
/// # Errors
///
/// Returns [`ProjectError::Format`] if formatting into the buffer fails.
pub fn generate(project: &Project, resolution: &Resolution) -> Result<String, ProjectError> {
    let mut out = String::new();
    let mut writer = BffWriter::new(&mut out);
    Generator {
        project,
        resolution,
        flags: FlagPropagator::new(project.targets(), resolution),
    }
    .write(&mut writer)?;
    Ok(out)
}

struct Generator<'a> {
    project: &'a Project,
    resolution: &'a Resolution,
    flags: FlagPropagator<'a>,
}

impl Generator<'_> {
    fn write<W: Write>(&self, w: &mut BffWriter<W>) -> Result<(), ProjectError> {
        w.directive(format_args!("#include \"{}\"", self.project.prelude()))?;
        w.newline()?;

        self.write_configs(w)?;
        for compiler in self.project.compilers().values() {
            write_compiler(w, compiler)?;
        }

        let ordered: Vec<&Target> = self
            .resolution
            .order()
            .iter()
            .filter_map(|name| self.project.target(name))
            .collect();
        for target in &ordered {
            self.write_globals(w, target)?;
        }

        let (specific, agnostic): (Vec<&Target>, Vec<&Target>) = ordered
            .iter()
            .copied()
            .partition(|target| target.is_config_dependent());
        for target in agnostic {
            self.write_function(w, target)?;
        }
        w.for_each(".BuildConfig", ".BuildConfigs", |w| {
            w.using(".BuildConfig")?;
            specific
                .iter()
                .try_for_each(|target| self.write_function(w, target))
        })
    }

    fn write_configs<W: Write>(&self, w: &mut BffWriter<W>) -> Result<(), ProjectError> {
        let configs = self.project.configs();
        if configs.is_empty() {
            return Ok(());
        }
        for config in configs {
            w.struct_var::<ProjectError, _>(&format!("BuildConfig_{config}"), |w| {
                w.var("Platform", self.project.platform().to_string())?;
                Ok(w.var("BuildConfigName", config)?)
            })?;
        }
        let refs = configs
            .iter()
            .map(|config| format!(".BuildConfig_{config}"))
            .join(", ");
        w.line(format_args!(".BuildConfigs = {{{refs}}}"))?;
        w.newline()?;
        Ok(())
    }

    fn write_globals<W: Write>(&self, w: &mut BffWriter<W>, target: &Target) -> Result<(), ProjectError> {
        let Some(flags) = self.flags.flags(target) else {
            return Ok(());
        };
        w.var(&target.base_path_var(), flags.base_path)?;
        w.var(&target.public_define_flag_var(), flags.public_defines)?;
        w.var(&target.public_include_flag_var(), flags.public_includes)?;
        w.var(&target.define_flag_var(), flags.defines)?;
        w.var(&target.include_flag_var(), flags.includes)?;
        w.newline()?;
        Ok(())
    }

    fn write_function<W: Write>(&self, w: &mut BffWriter<W>, target: &Target) -> Result<(), ProjectError> {
        let keyword = target.kind().keyword();
        let name = target.emission_name();
        if !target.emits_function() {
            return Ok(());
        }
        match target.kind() {
            TargetKind::ExternalLibrary(_) | TargetKind::HeaderOnlyLibrary(_) => Ok(()),
            TargetKind::ObjectList(list) => w.target(keyword, &name, |w| {
                self.write_object_list(w, target, list)
            }),
            TargetKind::Executable(exe) => {
                w.target(keyword, &name, |w| self.write_executable(w, target, exe))
            }
            TargetKind::Copy(copy) => w.target(keyword, &name, |w| {
                w.var("Source", &copy.source)?;
                Ok(w.var("Dest", &copy.dest)?)
            }),
            TargetKind::Alias => w.target(keyword, &name, |w| {
                let members: Vec<String> = target
                    .deps()
                    .iter()
                    .filter_map(|dep| self.project.target(dep))
                    .map(Target::emission_name)
                    .collect();
                Ok(w.var("Targets", members)?)
            }),
        }
    }

    fn write_object_list<W: Write>(
        &self,
        w: &mut BffWriter<W>,
        target: &Target,
        list: &ObjectList,
    ) -> Result<(), ProjectError> {
        let base = format!("${}$", target.base_path_var());
        let under_base = |items: &[String]| -> Vec<String> {
            items.iter().map(|item| format!("{base}/{item}")).collect()
        };

        if let Some(compiler) = &list.compiler {
            w.var("Compiler", compiler)?;
        }
        let sources = &list.sources;
        if !sources.paths.is_empty() {
            w.var("CompilerInputPath", under_base(&sources.paths))?;
            if !sources.recurse {
                w.var("CompilerInputPathRecurse", false)?;
            }
        }
        if !sources.patterns.is_empty() {
            w.var("CompilerInputPattern", Value::list(&sources.patterns))?;
        }
        if !sources.files.is_empty() {
            w.var("CompilerInputFiles", under_base(&sources.files))?;
        }

        let mut options = format!(
            " ${}$ ${}$",
            target.define_flag_var(),
            target.include_flag_var()
        );
        if let Some(extra) = &list.compiler_options {
            options.push(' ');
            options.push_str(extra);
        }
        if list.compiler.is_some() {
            w.var("CompilerOptions", options)?;
        } else if list.compile_as_c {
            w.var("CompilerOptions", format!("$CompilerOptionsC$ {options}"))?;
        } else {
            w.var_append("CompilerOptions", options)?;
        }

        let output = &list.output;
        if let Some(extension) = &output.extension {
            w.var("CompilerOutputExtension", extension)?;
        }
        if output.keep_base_extension {
            w.var("CompilerOutputKeepBaseExtension", true)?;
        }
        let root = if target.is_config_dependent() {
            OUTPUT_PATH
        } else {
            SHARED_OUTPUT_PATH
        };
        let output_path = output
            .path
            .clone()
            .unwrap_or_else(|| format!("{root}/{}", target.name()));
        w.var("CompilerOutputPath", output_path)?;
        if list.archive {
            w.var(
                "LibrarianOutput",
                librarian_output(self.project.platform(), root, target.name()),
            )?;
        }
        Ok(())
    }

    fn write_executable<W: Write>(
        &self,
        w: &mut BffWriter<W>,
        target: &Target,
        exe: &Executable,
    ) -> Result<(), ProjectError> {
        let closure: Vec<&Target> = self
            .resolution
            .all_deps(target.name())
            .iter()
            .filter_map(|dep| self.project.target(dep))
            .filter(|dep| dep.is_linkable())
            .collect();
        let objects = closure
            .iter()
            .filter(|dep| matches!(dep.kind(), TargetKind::ObjectList(_)))
            .map(|dep| dep.emission_name());
        let prebuilt = closure.iter().flat_map(|dep| match dep.kind() {
            TargetKind::ExternalLibrary(lib) => lib
                .libs
                .iter()
                .map(|file| format!("{}/{file}", lib.compile.base_path))
                .collect::<Vec<_>>(),
            _ => Vec::new(),
        });
        let libraries: Vec<String> = objects.chain(prebuilt).collect();

        w.var("Libraries", libraries)?;
        w.var("LinkerOutput", &exe.dest)?;
        w.var_append("LinkerOptions", linker_options(self.project.platform(), exe))?;
        Ok(())
    }
}

fn write_compiler<W: Write>(w: &mut BffWriter<W>, compiler: &Compiler) -> Result<(), ProjectError> {
    w.target("Compiler", &compiler.name, |w| {
        w.var("Executable", &compiler.executable)?;
        w.var("CompilerFamily", &compiler.family)?;
        Ok(w.var("AllowDistribution", compiler.allow_distribution)?)
    })
}

fn linker_options(platform: Platform, exe: &Executable) -> String {
    let mut options = match (platform, exe.subsystem) {
        (Platform::Windows, Subsystem::Console) => format!(" /subsystem:console {STATIC_CRT_LIBS}"),
        (Platform::Windows, Subsystem::Windows) => {
            format!(" /subsystem:windows /entry:WinMainCRTStartup {STATIC_CRT_LIBS}")
        }
        _ => String::new(),
    };
    if !exe.extra_libs.is_empty() {
        options.push(' ');
        options.push_str(&exe.extra_libs.join(" "));
    }
    options
}

fn librarian_output(platform: Platform, root: &str, name: &str) -> String {
    match platform {
        Platform::Windows => format!("{root}/{name}.lib"),
        Platform::Linux | Platform::Macos => format!("{root}/lib{name}.a"),
    }
}
