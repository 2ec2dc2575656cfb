//! # Command System
//!
//! Handler definitions, the registry they are loaded into, and the built-in
//! slash command and event handlers.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Definitions with validated schemas; registry loading with per-source reports
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 2.0.0: Remove bang commands, slash-only command system
//! - 1.0.0: Initial reorganization with modular command structure

pub mod context;
pub mod definition;
pub mod handler;
pub mod handlers;
pub mod registry;
pub mod slash;

pub use context::DispatchContext;
pub use definition::{
    CommandDefinition, CommandSchema, DefinitionError, EventDefinition, HandlerDefinition,
    MemberPermission, OptionKind, OptionSchema,
};
pub use handler::{AutocompleteExecutor, CommandExecutor, EventExecutor};
pub use handlers::builtin_definitions;
pub use registry::{
    load_definitions, CommandRegistry, DefinitionCandidate, FailedSource, RegistryHandle,
    RegistryLoadReport,
};
pub use slash::{
    create_slash_commands, get_bool_option, get_channel_option, get_integer_option,
    get_string_option, register_global_commands, register_guild_commands,
};
