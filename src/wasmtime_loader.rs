//! Default [`ModuleLoader`] backed by a wasmtime engine in the current process.
//!
//! Each loaded module gets its own [`Store`], so modules built from different
//! projects never share state. The context stored inside each new store comes
//! from a factory closure supplied by the host.

use wasmtime::{ Engine, Extern, Instance, Linker, Module, Mutability, Store, Val, ValType, WasmParams, WasmResults, TypedFunc };

use crate::loader::{ LoadError, LoadedModule, ModuleLoader, ModuleVersion };



/// Export names a module uses to declare its version, as immutable `i32` globals.
pub const VERSION_EXPORTS: [&str; 3] = [ "version-major", "version-minor", "version-patch" ];

/// Instantiates binary modules with a shared [`Linker`].
///
/// Host functions added to the linker are available to every module this loader
/// instantiates.
#[must_use = "pass the loader to a PluginBuilder or ModuleCompiler::compile"]
pub struct WasmtimeLoader<Ctx: 'static> {
	engine: Engine,
	linker: Linker<Ctx>,
	#[allow( clippy::type_complexity )]
	make_context: Box<dyn FnMut() -> Ctx + Send>,
}

impl WasmtimeLoader<()> {

	/// A loader with an empty linker and unit store data.
	pub fn with_engine( engine: &Engine ) -> Self {
		Self::new( engine, Linker::new( engine ), || ())
	}

}

impl<Ctx: 'static> WasmtimeLoader<Ctx> {

	/// Creates a loader that instantiates modules against `linker`.
	///
	/// `make_context` is called once per load to create the data of the new module's store.
	pub fn new(
		engine: &Engine,
		linker: Linker<Ctx>,
		make_context: impl FnMut() -> Ctx + Send + 'static,
	) -> Self {
		Self {
			engine: engine.clone(),
			linker,
			make_context: Box::new( make_context ),
		}
	}

	/// The engine modules are compiled with.
	#[inline] pub fn engine( &self ) -> &Engine { &self.engine }

}

impl<Ctx: 'static> ModuleLoader for WasmtimeLoader<Ctx> {

	type Module = LoadedPlugin<Ctx> ;

	fn load( &mut self, name: &str, binary: &[u8] ) -> Result<Self::Module, LoadError> {

		let module = Module::from_binary( &self.engine, binary )
			.map_err(| err | LoadError::InvalidModule( format!( "{:#}", err )))?;

		let mut store = Store::new( &self.engine, ( self.make_context )() );
		let instance = self.linker.instantiate( &mut store, &module )
			.map_err(| err | LoadError::InstantiationFailed( format!( "{:#}", err )))?;

		tracing::debug!( module = name, "module instantiated" );
		Ok( LoadedPlugin { name: name.to_string(), module, store, instance })

	}

}

impl<Ctx: std::fmt::Debug + 'static> std::fmt::Debug for WasmtimeLoader<Ctx> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "WasmtimeLoader" )
			.field( "make_context", &"<closure>" )
			.finish_non_exhaustive()
	}
}

/// A module instantiated by [`WasmtimeLoader`].
pub struct LoadedPlugin<Ctx: 'static> {
	name: String,
	module: Module,
	store: Store<Ctx>,
	instance: Instance,
}

impl<Ctx: 'static> LoadedPlugin<Ctx> {

	/// The process-unique name the module was loaded under.
	#[inline] pub fn name( &self ) -> &str { &self.name }

	/// The compiled module.
	#[inline] pub fn module( &self ) -> &Module { &self.module }

	/// The module's instance inside [`Self::store`].
	#[inline] pub fn instance( &self ) -> Instance { self.instance }

	#[inline] pub fn store( &self ) -> &Store<Ctx> { &self.store }
	#[inline] pub fn store_mut( &mut self ) -> &mut Store<Ctx> { &mut self.store }

	/// Looks up an exported function with a statically known signature.
	///
	/// # Errors
	/// Returns an error if the export is missing or its signature doesn't match.
	pub fn typed_func<Params, Results>( &mut self, name: &str ) -> Result<TypedFunc<Params, Results>, wasmtime::Error>
	where
		Params: WasmParams,
		Results: WasmResults,
	{
		self.instance.get_typed_func( &mut self.store, name )
	}

	/// Reads the current value of an exported global.
	pub fn global_value( &mut self, name: &str ) -> Option<Val> {
		let global = self.instance.get_global( &mut self.store, name )?;
		Some( global.get( &mut self.store ))
	}

	fn version_component( &mut self, export: &str ) -> Result<u32, LoadError> {

		let malformed = | reason: &str | LoadError::MalformedVersion {
			export: export.to_string(),
			reason: reason.to_string(),
		};

		let global = match self.instance.get_export( &mut self.store, export ) {
			None => return Ok( 0 ),
			Some( Extern::Global( global )) => global,
			Some( _ ) => return Err( malformed( "not a global" )),
		};

		let ty = global.ty( &self.store );
		if ty.mutability() != Mutability::Const { return Err( malformed( "global is mutable" )) }
		if !matches!( ty.content(), ValType::I32 ) { return Err( malformed( "global is not an i32" )) }

		match global.get( &mut self.store ) {
			Val::I32( value ) => u32::try_from( value ).map_err(|_| malformed( "value is negative" )),
			_ => Err( malformed( "global is not an i32" )),
		}

	}

}

impl<Ctx: 'static> LoadedModule for LoadedPlugin<Ctx> {
	fn declared_version( &mut self ) -> Result<ModuleVersion, LoadError> {
		let [ major, minor, patch ] = VERSION_EXPORTS;
		Ok( ModuleVersion::new(
			self.version_component( major )?,
			self.version_component( minor )?,
			self.version_component( patch )?,
		))
	}
}

impl<Ctx: std::fmt::Debug + 'static> std::fmt::Debug for LoadedPlugin<Ctx> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "LoadedPlugin" )
			.field( "name", &self.name )
			.field( "data", &self.store.data() )
			.finish_non_exhaustive()
	}
}

#[cfg( test )]
mod tests {

	use super::* ;

	fn load( wat: &str ) -> Result<LoadedPlugin<()>, LoadError> {
		let engine = Engine::default();
		let binary = wat::parse_str( wat ).expect( "test module must parse" );
		WasmtimeLoader::with_engine( &engine ).load( "test_module", &binary )
	}

	#[test]
	fn declared_version_is_read_from_exports() {
		let mut plugin = load( r#"(module
			(global (export "version-major") i32 (i32.const 2))
			(global (export "version-minor") i32 (i32.const 4))
			(global (export "version-patch") i32 (i32.const 1))
		)"# ).expect( "load failed" );
		assert_eq!( plugin.declared_version().expect( "version" ), ModuleVersion::new( 2, 4, 1 ));
		assert_eq!( plugin.name(), "test_module" );
	}

	#[test]
	fn missing_version_exports_read_as_zero() {
		let mut plugin = load( r#"(module
			(global (export "version-minor") i32 (i32.const 7))
		)"# ).expect( "load failed" );
		assert_eq!( plugin.declared_version().expect( "version" ), ModuleVersion::new( 0, 7, 0 ));
	}

	#[test]
	fn mutable_version_global_is_malformed() {
		let mut plugin = load( r#"(module
			(global (export "version-major") (mut i32) (i32.const 1))
		)"# ).expect( "load failed" );
		match plugin.declared_version() {
			Err( LoadError::MalformedVersion { export, .. }) => assert_eq!( export, "version-major" ),
			other => panic!( "Expected MalformedVersion, got: {:?}", other ),
		}
	}

	#[test]
	fn negative_version_is_malformed() {
		let mut plugin = load( r#"(module
			(global (export "version-patch") i32 (i32.const -1))
		)"# ).expect( "load failed" );
		assert!( matches!( plugin.declared_version(), Err( LoadError::MalformedVersion { .. })));
	}

	#[test]
	fn version_export_of_wrong_kind_is_malformed() {
		let mut plugin = load( r#"(module
			(func (export "version-major") (result i32) i32.const 1)
		)"# ).expect( "load failed" );
		assert!( matches!( plugin.declared_version(), Err( LoadError::MalformedVersion { .. })));
	}

	#[test]
	fn unresolved_import_fails_instantiation() {
		match load( r#"(module (import "host" "log" (func (param i32))))"# ) {
			Err( LoadError::InstantiationFailed( _ )) => {}
			other => panic!( "Expected InstantiationFailed, got: {:?}", other.map(| p | p.name().to_string() )),
		}
	}

	#[test]
	fn host_functions_come_from_the_linker() {
		let engine = Engine::default();
		let mut linker = Linker::new( &engine );
		linker.func_wrap( "host", "double", | x: i32 | x * 2 ).expect( "failed to define host function" );

		let binary = wat::parse_str( r#"(module
			(import "host" "double" (func $double (param i32) (result i32)))
			(func (export "run") (result i32) i32.const 21 call $double)
		)"# ).expect( "test module must parse" );

		let mut plugin = WasmtimeLoader::new( &engine, linker, || ())
			.load( "with_imports", &binary )
			.expect( "load failed" );
		let run = plugin.typed_func::<(), i32>( "run" ).expect( "missing export" );
		assert_eq!( run.call( plugin.store_mut(), () ).expect( "call failed" ), 42 );
	}

}
