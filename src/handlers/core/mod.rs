//! Core command infrastructure: argument parsing, player lookup, the
//! registry and dispatcher, pending menu choices, and output channels.

pub mod args;
pub mod context;
pub mod lookup;
pub mod output;
pub mod paginate;
pub mod pending;
pub mod registry;

pub use args::{ArgKind, ArgSpec, ArgValue, Args};
pub use context::{ChoiceContinuation, Context, Handler};
pub use lookup::{Lookup, resolve_player};
pub use output::{Output, OutputRef, PlayerOutput};
pub use paginate::{PageError, page, page_count, page_from_token};
pub use pending::{ChoiceError, PartialArgs, PendingChoice, PendingChoices, PendingKind};
pub use registry::{CommandDef, CommandRegistry, Dispatched, RegistryError};
