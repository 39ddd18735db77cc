//! Builds plugin projects from WebAssembly text sources into loaded modules.
//!
//! A plugin project is a directory of `.wat` files. Each file holds module fields
//! (`func`, `global`, `memory`, `export`, ...); together they form one module.
//! Building a project runs three steps:
//!
//! - **Trust gate**: projects downloaded from elsewhere ([`Origin::Remote`]) are only
//! 	built if their stable id or the SHA-256 of their artifact is on an allow-list
//! 	compiled into this crate. See [`TrustValidator`].
//!
//! - **Discovery**: git decides which files belong to the project (tracked plus
//! 	untracked-but-not-ignored); without a usable git the directory is scanned
//! 	instead. Build output directories are always skipped, and a project
//! 	descriptor can restrict the build to some subtrees. See [`SourceDiscoverer`].
//!
//! - **Compilation**: the files are spliced into one module, compiled to the binary
//! 	format and handed to a [`ModuleLoader`]. The module's version is read back
//! 	from the loaded instance. See [`ModuleCompiler`].
//!
//! [`PluginBuilder`] runs all three for a [`Project`].
//!
//! # Re-exports
//!
//! `wasm_loader` re-exports `Engine` and `Linker` from `wasmtime` for convenience.
//!
//! # Example
//!
//! ```
//! use wasm_loader::{ Engine, PluginBuilder, Project, WasmtimeLoader, ModuleVersion };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! std::fs::write( dir.path().join( "math.wat" ), r#"
//! 	(func $double (param i32) (result i32) local.get 0 i32.const 2 i32.mul)
//! "# )?;
//! std::fs::write( dir.path().join( "api.wat" ), r#"
//! 	(func (export "run") (result i32) i32.const 21 call $double)
//! 	(global (export "version-major") i32 (i32.const 1))
//! "# )?;
//!
//! let engine = Engine::default();
//! let mut builder = PluginBuilder::new( WasmtimeLoader::with_engine( &engine ));
//!
//! let mut module = builder.build( &Project::local( dir.path() ))?
//! 	.into_built()
//! 	.expect( "the project has sources" );
//! assert_eq!( module.version(), ModuleVersion::new( 1, 0, 0 ));
//!
//! let plugin = module.module_mut();
//! let run = plugin.typed_func::<(), i32>( "run" )?;
//! assert_eq!( run.call( plugin.store_mut(), () )?, 42 );
//! # Ok(())
//! # }
//! ```
//!
//! # Version metadata
//!
//! A module declares its version with immutable `i32` globals exported as
//! `version-major`, `version-minor` and `version-patch`. Missing exports read as
//! `0`, so a module that declares nothing is version `0.0.0`.
//!
//! # Logging
//!
//! The crate logs through [`tracing`] and never installs a subscriber itself.

mod compiler ;
mod descriptor ;
mod discovery ;
mod loader ;
mod pipeline ;
mod project ;
mod registry ;
mod trust ;
mod wasmtime_loader ;

#[doc( no_inline )]
pub use wasmtime::{ Engine, Linker };
#[doc( no_inline )]
pub use nonempty_collections::NEVec ;

pub use compiler::{ ModuleCompiler, SourceUnit, CompiledModule, CompileOutcome, CompileError, Diagnostic, unique_module_name };
pub use descriptor::{ Descriptor, DescriptorError };
pub use discovery::{ SourceDiscoverer, ListFiles, GitListing, ScanListing, DiscoveryError, SOURCE_EXTENSION, BUILD_OUTPUT_DIRS };
pub use loader::{ ModuleLoader, LoadedModule, ModuleVersion, LoadError };
pub use pipeline::{ PluginBuilder, BuildOutcome, BuildError };
pub use project::{ Project, Origin, ProjectMetadata };
pub use registry::{ ProjectRegistry, RegistryError };
pub use trust::{ TrustValidator, TrustDecision, content_hash };
pub use wasmtime_loader::{ WasmtimeLoader, LoadedPlugin, VERSION_EXPORTS };
