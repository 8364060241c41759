//! Site tools: the todo API boundary, the executor that dispatches to it and
//! the declarations advertised to the model.

pub mod arguments;
pub mod declarations;
pub mod executor;
pub mod http;
pub mod site;
pub mod types;

pub use arguments::ToolArguments;
pub use declarations::{all_declarations, render_declaration, site_declaration};
pub use executor::{SiteOperation, SiteToolExecutor, ToolExecutor};
pub use http::HttpTodoApi;
pub use site::{
    BulkOutcome, CreateTodo, Todo, TodoApi, TodoFilter, TodoPriority, TodoStatus, UpdateTodo,
};
pub use types::ToolParameters;
