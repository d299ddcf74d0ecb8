use std::collections::VecDeque;
use std::fmt;

/// A single message reported to the embedding runtime during a call.
///
/// Recoverable call failures (wrong arity, a guest value that does not fit a
/// parameter) are reported here instead of aborting the guest program.
///
/// # Examples
///
/// ```ignore
/// let diagnostic = Diagnostic::warning("argument 1 is not a Counter").in_function("count");
/// println!("{}", diagnostic); // count: warning: argument 1 is not a Counter
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The severity level of this diagnostic
    pub kind: DiagnosticKind,
    /// The diagnostic message text
    pub message: String,
    /// The native function being called, if any
    pub function: Option<String>,
}

/// The severity level of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A failure the guest program cannot continue past.
    Error,

    /// A recoverable failure; the call site received `null`.
    Warning,

    /// Informational output.
    Info,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            function: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, message)
    }

    /// Attach the function name this diagnostic belongs to.
    pub fn in_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }
}

/// A collection of diagnostics accumulated on a [`Context`](crate::Context).
///
/// # Examples
///
/// ```ignore
/// let mut ctx = Context::new();
/// ctx.call(&binding, &[])?;
///
/// if ctx.diagnostics().has_warnings() {
///     for warning in ctx.diagnostics().warnings() {
///         eprintln!("{}", warning);
///     }
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    diagnostics: VecDeque<Diagnostic>,
    has_errors: bool,
}

impl Diagnostics {
    /// Creates a new, empty diagnostics collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a diagnostic to the collection.
    ///
    /// If the diagnostic is an error, this will set the internal error flag.
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        if diagnostic.kind == DiagnosticKind::Error {
            self.has_errors = true;
        }
        self.diagnostics.push_back(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.of_kind(DiagnosticKind::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.of_kind(DiagnosticKind::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Removes all diagnostics and resets the error flag.
    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.has_errors = false;
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind_str = match self.kind {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Info => "info",
        };

        match &self.function {
            Some(function) => write!(f, "{}: {}: {}", function, kind_str, self.message),
            None => write!(f, "{}: {}", kind_str, self.message),
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::collections::vec_deque::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}
