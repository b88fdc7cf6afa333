//! engine
//!
//! Turns a cell script plus a session namespace into one executable unit and
//! hands it to the display surface.
//!
//! # Pipeline
//!
//! ```text
//! Namespace -> sanitize -> SanitizedNamespace
//!                                 |
//! raw script -> wrap (gate + error boundary) -> substitute -> display
//! ```
//!
//! Sanitizing and building are pure; only [`Engine::display_script`] has an
//! effect. A build failure (strict mode) therefore displays nothing.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use cellscript::core::namespace::Namespace;
//! use cellscript::core::registry::LibraryRegistry;
//! use cellscript::display::mock::RecordingDisplay;
//! use cellscript::engine::script::DependencySet;
//! use cellscript::engine::{Engine, EngineSettings};
//!
//! let registry = Arc::new(LibraryRegistry::with_libraries([("d3", "https://d3js.org/d3.v5.min")]).unwrap());
//! let display = RecordingDisplay::new();
//! let engine = Engine::new(registry, Box::new(display.clone()), EngineSettings::default());
//!
//! let ns = Namespace::new().with("x", 42);
//! engine.execute("console.log($$x)", &ns, &DependencySet::All).unwrap();
//!
//! assert!(display.last_script().unwrap().contains("console.log(42)"));
//! ```

pub mod assets;
pub mod invocation;
pub mod script;

use std::sync::Arc;

use thiserror::Error;

use crate::core::config::Config;
use crate::core::namespace::{Namespace, SanitizedNamespace};
use crate::core::registry::{LibraryRegistry, RegistryError, RegistrySnapshot};
use crate::core::sanitize::{sanitize, SanitizeOptions};
use crate::core::template::{SubstitutionMode, TemplateError};
use crate::display::{DisplayError, DisplayOutput, DisplaySurface};
use crate::ui::output::{self, Verbosity};

pub use assets::AssetError;
pub use invocation::{parse_require_line, Invocation, InvocationError};
pub use script::{build_executable_script, BuildOptions, DependencySet};

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// Settings the engine applies to every invocation.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Report values dropped for serialization reasons.
    pub warnings: bool,
    pub build: BuildOptions,
    /// Base sanitizer options; per-call bindings are added on top.
    pub sanitize: SanitizeOptions,
    /// Requirements used when the caller does not name any.
    pub requirements: DependencySet,
    pub verbosity: Verbosity,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            warnings: false,
            build: BuildOptions::default(),
            sanitize: SanitizeOptions::default(),
            requirements: DependencySet::All,
            verbosity: Verbosity::Normal,
        }
    }
}

impl EngineSettings {
    /// Settings taken from loaded configuration.
    pub fn from_config(config: &Config, verbosity: Verbosity) -> Self {
        let requirements = match config.default_requirements() {
            Some(names) => DependencySet::explicit(names.iter().cloned()),
            None => DependencySet::All,
        };

        Self {
            warnings: config.warnings(),
            build: BuildOptions {
                delimiter: config.delimiter(),
                mode: config.substitution_mode(),
            },
            sanitize: config.sanitize_options(),
            requirements,
            verbosity,
        }
    }
}

/// The script executor.
pub struct Engine {
    registry: Arc<LibraryRegistry>,
    display: Box<dyn DisplaySurface>,
    settings: EngineSettings,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(
        registry: Arc<LibraryRegistry>,
        display: Box<dyn DisplaySurface>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            registry,
            display,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<LibraryRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Sanitize `namespace`, with optional extra `bindings`.
    ///
    /// Serialization skips are reported when warnings are enabled.
    pub fn sanitize(&self, namespace: &Namespace, bindings: Option<&Namespace>) -> SanitizedNamespace {
        let outcome = match bindings {
            Some(bindings) => {
                let mut options = self.settings.sanitize.clone();
                for (name, value) in bindings.iter() {
                    options.bindings.insert_shared(name, Arc::clone(value));
                }
                sanitize(namespace, &options)
            }
            None => sanitize(namespace, &self.settings.sanitize),
        };

        let verbosity = self.settings.verbosity;
        if self.settings.warnings {
            for entry in outcome.warnings() {
                output::warn(
                    format!("variable '{}' was not embedded: {}", entry.name, entry.reason),
                    verbosity,
                );
            }
        }
        for entry in outcome.skipped.iter().filter(|e| !e.is_warning()) {
            output::debug(format!("skipped '{}': {}", entry.name, entry.reason), verbosity);
        }

        outcome.namespace
    }

    /// Build the executable script without displaying it.
    ///
    /// # Errors
    ///
    /// Fails in strict mode when a placeholder has no value.
    pub fn build(
        &self,
        raw: &str,
        namespace: &Namespace,
        required: &DependencySet,
    ) -> Result<String, EngineError> {
        self.build_with_bindings(raw, namespace, required, None)
    }

    /// Like [`Engine::build`], with explicit bindings.
    pub fn build_with_bindings(
        &self,
        raw: &str,
        namespace: &Namespace,
        required: &DependencySet,
        bindings: Option<&Namespace>,
    ) -> Result<String, EngineError> {
        let sanitized = self.sanitize(namespace, bindings);
        let requirements = required.resolve(&self.registry.snapshot());

        output::debug(
            format!(
                "building script: {} variable(s), requirements [{}]",
                sanitized.len(),
                requirements.join(", ")
            ),
            self.settings.verbosity,
        );

        Ok(build_executable_script(
            raw,
            &requirements,
            &sanitized,
            &self.settings.build,
        )?)
    }

    /// Build and display a script.
    pub fn execute(
        &self,
        raw: &str,
        namespace: &Namespace,
        required: &DependencySet,
    ) -> Result<(), EngineError> {
        let script = self.build(raw, namespace, required)?;
        self.display_script(script)
    }

    /// Build and display a script with explicit bindings.
    pub fn execute_with_bindings(
        &self,
        raw: &str,
        namespace: &Namespace,
        required: &DependencySet,
        bindings: &Namespace,
    ) -> Result<(), EngineError> {
        let script = self.build_with_bindings(raw, namespace, required, Some(bindings))?;
        self.display_script(script)
    }

    /// Run an invocation against the session namespace.
    ///
    /// The line form sees `local` layered over `session`; the cell form sees
    /// `session` only. `required` falls back to the configured requirements.
    pub fn run(
        &self,
        invocation: &Invocation<'_>,
        session: &Namespace,
        local: Option<&Namespace>,
        required: Option<&DependencySet>,
    ) -> Result<(), EngineError> {
        let required = required.unwrap_or(&self.settings.requirements);

        match (invocation, local) {
            (Invocation::Line { script }, Some(local)) => {
                self.execute(script, &session.overlay(local), required)
            }
            _ => self.execute(invocation.script(), session, required),
        }
    }

    /// Merge `entries` into the registry and publish the loader config.
    ///
    /// # Errors
    ///
    /// Invalid entries leave the registry unchanged and display nothing.
    pub fn register_libraries<I, N, L>(&self, entries: I) -> Result<Arc<RegistrySnapshot>, EngineError>
    where
        I: IntoIterator<Item = (N, L)>,
        N: AsRef<str>,
        L: AsRef<str>,
    {
        let snapshot = self.registry.merge(entries)?;
        output::debug(
            format!("registry now holds {} libraries", snapshot.len()),
            self.settings.verbosity,
        );
        self.display_script(snapshot.require_config_script())?;
        Ok(snapshot)
    }

    /// Handle a `%require <name> <path>` line.
    pub fn require_line(&self, line: &str) -> Result<Arc<RegistrySnapshot>, EngineError> {
        let (name, path) = parse_require_line(line)?;
        self.register_libraries([(name, path)])
    }

    /// Publish the current registry as a loader config script.
    pub fn publish_registry(&self) -> Result<(), EngineError> {
        self.display_script(self.registry.snapshot().require_config_script())
    }

    /// Enable JavaScript highlighting for `%%<magic>` cells.
    ///
    /// Runs through the dependency gate, with no variables and safe
    /// substitution regardless of settings.
    pub fn activate_syntax_highlight(&self, magic: &str) -> Result<(), EngineError> {
        let body = assets::syntax_highlight(magic)?;
        let options = BuildOptions {
            delimiter: self.settings.build.delimiter,
            mode: SubstitutionMode::Safe,
        };
        let script = build_executable_script(
            &body,
            &[assets::CODECELL_MODULE.to_string()],
            &SanitizedNamespace::new(),
            &options,
        )?;
        self.display_script(script)
    }

    /// Hand a finished script to the display surface.
    pub fn display_script(&self, script: String) -> Result<(), EngineError> {
        self.display.display(DisplayOutput::Javascript(script))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::namespace::Opaque;
    use crate::display::mock::RecordingDisplay;

    fn engine_with(settings: EngineSettings) -> (Engine, RecordingDisplay) {
        let registry = Arc::new(
            LibraryRegistry::with_libraries([
                ("d3", "https://d3js.org/d3.v5.min"),
                ("d3-hierarchy", "https://d3js.org/d3-hierarchy.v1.min"),
            ])
            .unwrap(),
        );
        let display = RecordingDisplay::new();
        let engine = Engine::new(registry, Box::new(display.clone()), settings);
        (engine, display)
    }

    fn engine() -> (Engine, RecordingDisplay) {
        engine_with(EngineSettings::default())
    }

    #[test]
    fn execute_displays_one_script() {
        let (engine, display) = engine();
        let ns = Namespace::new().with("x", 42_i32);

        engine
            .execute("console.log($$x)", &ns, &DependencySet::All)
            .unwrap();

        let scripts = display.scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("console.log(42)"));
        assert!(scripts[0].contains(r#"["d3", "d3-hierarchy"]"#));
    }

    #[test]
    fn unserializable_values_are_not_embedded() {
        let (engine, display) = engine_with(EngineSettings {
            warnings: true,
            verbosity: Verbosity::Quiet,
            ..EngineSettings::default()
        });
        let ns = Namespace::new()
            .with("data", vec![1_i32, 2_i32])
            .with("df", Opaque::new("DataFrame"));

        engine
            .execute("draw($$data, $$df)", &ns, &DependencySet::All)
            .unwrap();

        let script = display.last_script().unwrap();
        assert!(script.contains("draw([1,2], $$df)"));
    }

    #[test]
    fn bindings_override_namespace() {
        let (engine, display) = engine();
        let ns = Namespace::new().with("x", 1_i32);
        let bindings = Namespace::new().with("x", 2_i32);

        engine
            .execute_with_bindings("f($$x)", &ns, &DependencySet::All, &bindings)
            .unwrap();

        assert!(display.last_script().unwrap().contains("f(2)"));
    }

    #[test]
    fn strict_failure_displays_nothing() {
        let (engine, display) = engine_with(EngineSettings {
            build: BuildOptions {
                mode: SubstitutionMode::Strict,
                ..BuildOptions::default()
            },
            ..EngineSettings::default()
        });

        let result = engine.execute("f($$missing)", &Namespace::new(), &DependencySet::All);

        assert!(matches!(
            result,
            Err(EngineError::Template(TemplateError::UnresolvedPlaceholder { .. }))
        ));
        assert!(display.outputs().is_empty());
    }

    #[test]
    fn line_form_sees_local_namespace() {
        let (engine, display) = engine();
        let session = Namespace::new().with("x", 1_i32).with("y", 1_i32);
        let local = Namespace::new().with("x", 5_i32);

        engine
            .run(&Invocation::new("f($$x, $$y)", None), &session, Some(&local), None)
            .unwrap();
        assert!(display.last_script().unwrap().contains("f(5, 1)"));

        engine
            .run(&Invocation::new("", Some("f($$x, $$y)")), &session, Some(&local), None)
            .unwrap();
        assert!(display.last_script().unwrap().contains("f(1, 1)"));
    }

    #[test]
    fn run_uses_configured_requirements() {
        let (engine, display) = engine_with(EngineSettings {
            requirements: DependencySet::explicit(["d3"]),
            ..EngineSettings::default()
        });

        engine
            .run(&Invocation::new("draw();", None), &Namespace::new(), None, None)
            .unwrap();

        assert!(display.last_script().unwrap().contains(r#"const cellscriptRequirements = ["d3"];"#));
    }

    #[test]
    fn register_libraries_publishes_config() {
        let (engine, display) = engine();

        let snapshot = engine
            .register_libraries([("topojson", "https://unpkg.com/topojson@3.js")])
            .unwrap();

        assert_eq!(snapshot.len(), 3);
        let script = display.last_script().unwrap();
        assert!(script.starts_with("require.config({"));
        assert!(script.contains(r#""topojson": "https://unpkg.com/topojson@3""#));
    }

    #[test]
    fn invalid_registration_changes_nothing() {
        let (engine, display) = engine();

        let result = engine.register_libraries([("ok", "/ok"), ("bad name", "/x")]);

        assert!(matches!(result, Err(EngineError::Registry(_))));
        assert_eq!(engine.registry().snapshot().len(), 2);
        assert!(display.outputs().is_empty());
    }

    #[test]
    fn require_line_registers() {
        let (engine, _display) = engine();

        engine.require_line("vega https://cdn.example/vega").unwrap();
        assert_eq!(
            engine.registry().snapshot().location("vega"),
            Some("https://cdn.example/vega")
        );

        assert!(matches!(
            engine.require_line("vega"),
            Err(EngineError::Invocation(_))
        ));
    }

    #[test]
    fn highlight_goes_through_gate() {
        let (engine, display) = engine();

        engine.activate_syntax_highlight("d3").unwrap();

        let script = display.last_script().unwrap();
        assert!(script.contains(r#"["notebook/js/codecell"]"#));
        assert!(script.contains("function (notebook_js_codecell)"));
    }

    #[test]
    fn display_failure_propagates() {
        let (engine, display) = engine();
        display.fail_with("no frontend");

        let result = engine.execute("f()", &Namespace::new(), &DependencySet::All);
        assert!(matches!(result, Err(EngineError::Display(_))));
    }
}
