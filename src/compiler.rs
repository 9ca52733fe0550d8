//! External compiler descriptors.

use serde::{Deserialize, Serialize};

/// A named external tool that object lists may select instead of the
/// default compiler, such as a shader compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Compiler {
    /// Unique name referenced by object lists.
    pub name: String,
    /// Path to the compiler executable.
    pub executable: String,
    /// FASTBuild compiler family tag, for example `msvc` or `custom`.
    pub family: String,
    /// Whether FASTBuild may distribute jobs for this compiler to workers.
    #[serde(default = "default_allow_distribution")]
    pub allow_distribution: bool,
}

const fn default_allow_distribution() -> bool {
    true
}

impl Compiler {
    /// Describe a compiler that may be distributed.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        executable: impl Into<String>,
        family: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            executable: executable.into(),
            family: family.into(),
            allow_distribution: true,
        }
    }

    /// Set whether jobs may be distributed to remote workers.
    #[must_use]
    pub fn with_distribution(mut self, allow: bool) -> Self {
        self.allow_distribution = allow;
        self
    }
}
