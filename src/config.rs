// ABOUTME: Version info and REPL banner text.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_MESSAGE: &str = "tree-lisp";
pub const WELCOME_SUBTITLE: &str = "A tree-walking Scheme-family interpreter";
pub const WELCOME_FOOTER: &str = "Type (exit) or Ctrl-D to quit.";

pub const REPL_PROMPT: &str = ">>> ";
pub const REPL_CONTINUATION_PROMPT: &str = "... ";

/// `pool.gc()` is invoked once per top-level form in REPL mode, and every
/// this-many top-level forms in file mode.
pub const FILE_MODE_GC_INTERVAL: usize = 24;
