//! Indentation-aware writer for FASTBuild descriptor text.
//!
//! [`BffWriter`] knows nothing about targets. It offers scoped function
//! blocks, struct blocks and `.Name = value` assignments, and renders values
//! with [`Value`]. The generator in [`crate::bff_gen`] composes these
//! primitives.
//!
//! # Examples
//!
//! ```
//! use bffgen::writer::{BffWriter, Value};
//!
//! let mut out = String::new();
//! let mut writer = BffWriter::new(&mut out);
//! writer
//!     .function("Copy", "'dll'", |w| {
//!         w.var("Source", "a.dll")?;
//!         w.var("Dest", "bin/a.dll")
//!     })
//!     .expect("write");
//! assert_eq!(out, "Copy('dll')\n{\n\t.Source = 'a.dll'\n\t.Dest = 'bin/a.dll'\n}\n");
//! ```

use itertools::Itertools;
use std::fmt::{self, Display, Formatter, Write};

/// A value on the right-hand side of a descriptor assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Rendered as a single-quoted literal.
    Str(String),
    /// Rendered as a bare `true` or `false`.
    Bool(bool),
    /// Rendered empty, unwrapped, or as a braced list depending on length.
    List(Vec<Value>),
}

impl Value {
    /// Build a list value from anything convertible into values.
    #[must_use]
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::list(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "'{}'", escape(s)),
            Self::Bool(b) => write!(f, "{b}"),
            Self::List(items) => match items.as_slice() {
                [] => Ok(()),
                [single] => single.fmt(f),
                many => write!(f, "{{{}}}", many.iter().join(", ")),
            },
        }
    }
}

/// Escape the FASTBuild escape character and single quotes.
///
/// `$` is left alone so `$Var$` references keep expanding inside literals.
fn escape(s: &str) -> String {
    s.replace('^', "^^").replace('\'', "^'")
}

/// Structured emitter writing tab-indented descriptor lines into `W`.
pub struct BffWriter<W> {
    out: W,
    depth: usize,
}

impl<W: Write> BffWriter<W> {
    /// Wrap an output sink. Indentation starts at zero.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out, depth: 0 }
    }

    /// Current indentation depth.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Return the wrapped sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn indent(&mut self) -> fmt::Result {
        for _ in 0..self.depth {
            self.out.write_char('\t')?;
        }
        Ok(())
    }

    /// Write one indented line.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying sink.
    pub fn line(&mut self, text: impl Display) -> fmt::Result {
        self.indent()?;
        writeln!(self.out, "{text}")
    }

    /// Write an unindented line, for preprocessor directives.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying sink.
    pub fn directive(&mut self, text: impl Display) -> fmt::Result {
        writeln!(self.out, "{text}")
    }

    /// Write an empty line.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying sink.
    pub fn newline(&mut self) -> fmt::Result {
        self.out.write_char('\n')
    }

    /// Write `.name = value`.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying sink.
    pub fn var(&mut self, name: &str, value: impl Into<Value>) -> fmt::Result {
        self.line(format_args!(".{name} = {}", value.into()))
    }

    /// Write `.name + value`.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying sink.
    pub fn var_append(&mut self, name: &str, value: impl Into<Value>) -> fmt::Result {
        self.line(format_args!(".{name} + {}", value.into()))
    }

    /// Write `Using(value)`.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying sink.
    pub fn using(&mut self, value: &str) -> fmt::Result {
        self.line(format_args!("Using({value})"))
    }

    fn open(&mut self, brace: char) -> fmt::Result {
        self.line(brace)?;
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, brace: char) -> fmt::Result {
        self.depth = self.depth.saturating_sub(1);
        self.line(brace)
    }

    /// Run `body` between two delimiter lines, closing on every exit path.
    fn scoped<E, F>(&mut self, open: char, close: char, body: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
        E: From<fmt::Error>,
    {
        self.open(open)?;
        let result = body(self);
        let closed = self.close(close);
        result?;
        closed.map_err(E::from)
    }

    /// Emit `command(param)` followed by a braced body.
    ///
    /// The closing brace is written even when `body` fails, and the body's
    /// error takes precedence over any sink error raised while closing.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `body` or by the sink.
    pub fn function<E, F>(&mut self, command: &str, param: &str, body: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
        E: From<fmt::Error>,
    {
        self.line(format_args!("{command}({param})"))?;
        self.scoped('{', '}', body)
    }

    /// Emit a function block whose parameter is a quoted target name.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `body` or by the sink.
    pub fn target<E, F>(&mut self, command: &str, name: &str, body: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
        E: From<fmt::Error>,
    {
        self.function(command, &Value::from(name).to_string(), body)
    }

    /// Emit `ForEach(item in list)` with a braced body.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `body` or by the sink.
    pub fn for_each<E, F>(&mut self, item: &str, list: &str, body: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
        E: From<fmt::Error>,
    {
        self.function("ForEach", &format!("{item} in {list}"), body)
    }

    /// Emit `.name =` followed by a bracketed struct body.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `body` or by the sink.
    pub fn struct_var<E, F>(&mut self, name: &str, body: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
        E: From<fmt::Error>,
    {
        self.line(format_args!(".{name} ="))?;
        self.scoped('[', ']', body)
    }
}
