#[path = "integration/session.rs"]
mod session;
#[path = "integration/presentation.rs"]
mod presentation;
#[path = "integration/completion.rs"]
mod completion;
#[path = "integration/bindings.rs"]
mod bindings;
